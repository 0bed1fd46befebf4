//! Detail pass: visit each product page, pull the description, and resolve
//! the affiliate share link.
//!
//! Every record is its own failure boundary. A page that errors out gets its
//! pending fields settled (description failed, affiliate link falls back to
//! the listing link) and the pass moves on.

use crate::browser::session::screenshot_path;
use crate::browser::{DetailPage, ListingSurface, Locator};
use crate::scrape::share::ShareResolver;
use crate::sites::models::FieldState;
use crate::sites::{selectors, ProductRecord, Site};
use anyhow::Result;
use rand::Rng;
use scraper::{Html, Selector};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

fn description_selector(site: Site) -> &'static Selector {
    match site {
        Site::MercadoLivre => &selectors::mercado_livre::DESCRIPTION,
        Site::AmazonBr => &selectors::amazon_br::DESCRIPTION,
    }
}

/// Enriches listing records by visiting each product page.
pub struct DetailPass {
    site: Site,
    resolver: ShareResolver,
    wait: Duration,
    description_limit: usize,
    delay: Duration,
    jitter: Duration,
    screenshot_dir: Option<PathBuf>,
}

impl DetailPass {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            resolver: ShareResolver::new(site),
            wait: Duration::from_secs(30),
            description_limit: 500,
            delay: Duration::from_secs(2),
            jitter: Duration::from_secs(3),
            screenshot_dir: None,
        }
    }

    pub fn with_resolver(mut self, resolver: ShareResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    /// Base delay and random jitter between product visits.
    pub fn with_delays(mut self, delay: Duration, jitter: Duration) -> Self {
        self.delay = delay;
        self.jitter = jitter;
        self
    }

    /// Directory for failure screenshots. None disables them.
    pub fn with_screenshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.screenshot_dir = dir;
        self
    }

    /// Visits every record still carrying pending detail fields.
    pub async fn run<S>(&self, surface: &S, records: &mut [ProductRecord])
    where
        S: ListingSurface + DetailPage,
    {
        let total = records.len();
        for (idx, record) in records.iter_mut().enumerate() {
            if !record.affiliate_link.is_pending() && !record.description.is_pending() {
                continue;
            }
            info!("Visiting product {}/{}: {}", idx + 1, total, record.title);

            if let Err(e) = self.visit(surface, record).await {
                warn!("Product {} failed: {}", record.id, e);
                self.capture_failure(surface, record.id).await;
                if record.description.is_pending() {
                    record.description = FieldState::Failed;
                }
            }
            // Whatever happened, the record leaves with a usable link
            if record.affiliate_link.is_pending() {
                record.affiliate_link = FieldState::Resolved(record.link.clone());
            }

            if idx + 1 < total {
                self.pause_between_visits().await;
            }
        }
    }

    async fn visit<S>(&self, surface: &S, record: &mut ProductRecord) -> Result<()>
    where
        S: ListingSurface + DetailPage,
    {
        surface.goto(&record.link).await?;
        surface.wait_for(&Locator::css("body"), self.wait).await?;

        if record.description.is_pending() {
            let html = surface.page_source().await?;
            record.description = self.extract_description(&html);
        }

        let link = self.resolver.resolve(surface, &record.link).await;
        record.affiliate_link = FieldState::Resolved(link);
        Ok(())
    }

    /// Pulls the description block out of a detail-page snapshot, truncated
    /// to the configured length.
    fn extract_description(&self, html: &str) -> FieldState {
        let document = Html::parse_document(html);
        let Some(block) = document.select(description_selector(self.site)).next() else {
            debug!("No description block on this page");
            return FieldState::Unavailable;
        };

        let text = block.text().collect::<String>().trim().to_string();
        if text.is_empty() {
            return FieldState::Unavailable;
        }
        FieldState::Resolved(text.chars().take(self.description_limit).collect())
    }

    async fn capture_failure<S: ListingSurface>(&self, surface: &S, record_id: usize) {
        let Some(dir) = &self.screenshot_dir else { return };
        let path = screenshot_path(dir, &format!("error_product_{}", record_id));
        if let Err(e) = surface.screenshot(&path).await {
            debug!("Failure screenshot could not be saved: {}", e);
        }
    }

    async fn pause_between_visits(&self) {
        if self.delay.is_zero() && self.jitter.is_zero() {
            return;
        }
        let jitter_ms = if self.jitter.is_zero() {
            0
        } else {
            rand::rng().random_range(0..self.jitter.as_millis() as u64)
        };
        let pause = self.delay + Duration::from_millis(jitter_ms);
        debug!("Waiting {:?} before the next product", pause);
        tokio::time::sleep(pause).await;
    }
}
