//! Scrape command implementation.

use crate::browser::session::screenshot_path;
use crate::browser::{BrowserConfig, ListingSurface, ScrollSurface, Session};
use crate::config::Config;
use crate::export::Exporter;
use crate::scrape::{DetailPass, ListingPass, ShareResolver};
use crate::sites::models::RunSummary;
use crate::sites::parser::ListingParser;
use crate::sites::{category_from_url, ProductRecord};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs the full pipeline: listing pass, detail pass, export.
pub struct ScrapeCommand {
    config: Config,
}

impl ScrapeCommand {
    /// Creates a new scrape command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the scrape and returns the exported file path.
    ///
    /// With no URLs given, the site's default deals page is used. Whatever
    /// was collected before a failure still gets exported.
    pub async fn execute(&self, urls: &[String]) -> Result<PathBuf> {
        let site = self.config.site;
        let urls = if urls.is_empty() {
            vec![site.deals_url().to_string()]
        } else {
            urls.to_vec()
        };

        let session = Session::launch(&BrowserConfig::from_config(&self.config))
            .await
            .context("Failed to start the browser session")?;
        let page = session.page();

        let mut records = self.run_listings(&page, &urls).await;

        if self.config.skip_details {
            info!("Skipping product visits ({} records)", records.len());
        } else if !records.is_empty() {
            self.detail_pass().run(&page, &mut records).await;
        }

        let summary = RunSummary::from_records(&records);
        info!(
            "Collected {} products ({} with share links, {} with descriptions)",
            summary.total, summary.with_affiliate_link, summary.with_description
        );

        // Export before teardown so a stuck driver cannot eat the data
        let exported = Exporter::from_config(&self.config).export(site, &records);
        if let Err(e) = session.quit().await {
            warn!("Browser session did not shut down cleanly: {}", e);
        }
        exported
    }

    /// Runs the listing pass over every URL. Each URL is its own failure
    /// boundary: a failed page is screenshotted and skipped.
    pub async fn run_listings<S>(&self, surface: &S, urls: &[String]) -> Vec<ProductRecord>
    where
        S: ListingSurface + ScrollSurface,
    {
        let pass = ListingPass::new(self.config.site)
            .with_wait(self.config.wait())
            .with_scroll(self.config.scroll())
            .with_parser(ListingParser::with_default(
                self.config.site,
                self.config.missing_value.clone(),
            ));

        let mut all = Vec::new();
        for url in urls {
            match pass.run(surface, url).await {
                Ok(records) => all.extend(records),
                Err(e) => {
                    let category = category_from_url(url);
                    warn!("Listing failed for {} ({}): {}", url, category, e);
                    let path = screenshot_path(
                        &self.config.output_dir,
                        &format!("error_{}", category),
                    );
                    if let Err(e) = surface.screenshot(&path).await {
                        debug!("Failure screenshot could not be saved: {}", e);
                    }
                }
            }
        }
        all
    }

    fn detail_pass(&self) -> DetailPass {
        let site = self.config.site;
        DetailPass::new(site)
            .with_resolver(ShareResolver::new(site).with_timeout(self.config.short_wait()))
            .with_wait(self.config.wait())
            .with_description_limit(self.config.description_limit)
            .with_delays(
                Duration::from_millis(self.config.delay_ms),
                Duration::from_millis(self.config.delay_jitter_ms),
            )
            .with_screenshot_dir(Some(self.config.output_dir.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Locator;
    use crate::scrape::ScrapeError;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct FakeSurface {
        html: String,
        failing_urls: Vec<String>,
        current: Mutex<String>,
        screenshots: AtomicU32,
    }

    impl FakeSurface {
        fn new(html: &str) -> Self {
            Self {
                html: html.to_string(),
                failing_urls: Vec::new(),
                current: Mutex::new(String::new()),
                screenshots: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ListingSurface for FakeSurface {
        async fn goto(&self, url: &str) -> Result<()> {
            *self.current.lock().unwrap() = url.to_string();
            Ok(())
        }

        async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
            let current = self.current.lock().unwrap().clone();
            if self.failing_urls.iter().any(|u| *u == current) {
                Err(anyhow!(ScrapeError::StructureTimeout {
                    locator: locator.to_string(),
                    timeout_secs: timeout.as_secs(),
                }))
            } else {
                Ok(())
            }
        }

        async fn page_source(&self) -> Result<String> {
            Ok(self.html.clone())
        }

        async fn screenshot(&self, _path: &Path) -> Result<()> {
            self.screenshots.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl ScrollSurface for FakeSurface {
        async fn scroll_to_bottom(&self) -> Result<()> {
            Ok(())
        }

        async fn scroll_to_top(&self) -> Result<()> {
            Ok(())
        }

        async fn document_height(&self) -> Result<i64> {
            Ok(1000)
        }
    }

    fn fast_config() -> Config {
        Config {
            wait_secs: 0,
            short_wait_secs: 0,
            scroll_max_attempts: 3,
            scroll_settle_streak: 1,
            scroll_pause_ms: 0,
            delay_ms: 0,
            delay_jitter_ms: 0,
            output_dir: std::env::temp_dir(),
            ..Config::default()
        }
    }

    const CARD_HTML: &str = r#"
        <div class="andes-card">
            <a class="poly-component__title" href="https://ml.example/p/1">Fone Bluetooth</a>
        </div>"#;

    #[tokio::test]
    async fn test_failed_url_is_skipped_with_screenshot() {
        let mut surface = FakeSurface::new(CARD_HTML);
        surface.failing_urls.push("https://ml.example/ofertas?category=MLB2".into());

        let command = ScrapeCommand::new(fast_config());
        let urls = vec![
            "https://ml.example/ofertas?category=MLB1".to_string(),
            "https://ml.example/ofertas?category=MLB2".to_string(),
            "https://ml.example/ofertas?category=MLB3".to_string(),
        ];
        let records = command.run_listings(&surface, &urls).await;

        // Categories 1 and 3 each produced their card; 2 was screenshotted
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category, "MLB1");
        assert_eq!(records[1].category, "MLB3");
        assert_eq!(surface.screenshots.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_missing_value_flows_to_parser() {
        let surface = FakeSurface::new(CARD_HTML);

        let mut config = fast_config();
        config.missing_value = "n/a".to_string();
        let command = ScrapeCommand::new(config);

        let records = command
            .run_listings(&surface, &["https://ml.example/ofertas".to_string()])
            .await;
        assert_eq!(records.len(), 1);
        // The card has no price markup, so the sentinel shows through
        assert_eq!(records[0].original_price, "n/a");
        assert_eq!(records[0].discount_price, "n/a");
    }
}
