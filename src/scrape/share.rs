//! Share-link resolver.
//!
//! Given a loaded product detail page, tries to open the share UI and
//! capture the generated affiliate link. Never fails: any miss at any
//! stage degrades to the listing link.

use crate::browser::{DetailPage, Locator, PageControl};
use crate::sites::selectors::ShareSelectors;
use crate::sites::Site;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Accepts a captured value only when it looks like an absolute URL.
pub fn is_share_url(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.starts_with("http")
}

/// One way of locating the share control on a detail page.
///
/// Strategies are tried in a fixed order; the first one returning an
/// element wins and later strategies never run.
#[async_trait]
pub trait LocateStrategy<P: DetailPage>: Send + Sync {
    async fn locate(&self, page: &P) -> Result<Option<P::Control>>;

    fn description(&self) -> String;
}

/// Structural locator keyed on the control's visible label.
struct ByLabelXPath {
    xpath: &'static str,
    timeout: Duration,
}

#[async_trait]
impl<P: DetailPage> LocateStrategy<P> for ByLabelXPath {
    async fn locate(&self, page: &P) -> Result<Option<P::Control>> {
        page.find_clickable(&Locator::xpath(self.xpath), self.timeout).await
    }

    fn description(&self) -> String {
        "label xpath".to_string()
    }
}

/// Attribute-based CSS locator.
struct ByAttributeCss {
    css: &'static str,
    timeout: Duration,
}

#[async_trait]
impl<P: DetailPage> LocateStrategy<P> for ByAttributeCss {
    async fn locate(&self, page: &P) -> Result<Option<P::Control>> {
        page.find_clickable(&Locator::css(self.css), self.timeout).await
    }

    fn description(&self) -> String {
        "attribute css".to_string()
    }
}

/// DOM-wide script query matching text/aria-label/test-id against the
/// share vocabulary.
struct ByScriptQuery {
    vocabulary: &'static [&'static str],
}

#[async_trait]
impl<P: DetailPage> LocateStrategy<P> for ByScriptQuery {
    async fn locate(&self, page: &P) -> Result<Option<P::Control>> {
        page.find_by_vocabulary(self.vocabulary).await
    }

    fn description(&self) -> String {
        "script query".to_string()
    }
}

/// Brute-force scan of every button's visible text.
struct ByButtonScan {
    vocabulary: &'static [&'static str],
}

#[async_trait]
impl<P: DetailPage> LocateStrategy<P> for ByButtonScan {
    async fn locate(&self, page: &P) -> Result<Option<P::Control>> {
        for button in page.buttons().await? {
            // Unreadable buttons (stale, hidden) are skipped, not fatal
            let Ok(text) = button.text().await else { continue };
            let text = text.to_lowercase();
            if self.vocabulary.iter().any(|word| text.contains(word)) {
                return Ok(Some(button));
            }
        }
        Ok(None)
    }

    fn description(&self) -> String {
        "button scan".to_string()
    }
}

/// Ordered chain of locate strategies, first hit wins.
pub struct StrategyChain<P: DetailPage> {
    strategies: Vec<Box<dyn LocateStrategy<P>>>,
}

impl<P: DetailPage> StrategyChain<P> {
    pub fn new() -> Self {
        Self { strategies: Vec::new() }
    }

    pub fn add(&mut self, strategy: impl LocateStrategy<P> + 'static) -> &mut Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Runs the strategies in order until one yields an element. A strategy
    /// that errors is logged and skipped, same as a miss.
    pub async fn locate(&self, page: &P) -> Option<P::Control> {
        for strategy in &self.strategies {
            debug!("Locating share control via {}", strategy.description());
            match strategy.locate(page).await {
                Ok(Some(control)) => {
                    debug!("Share control found via {}", strategy.description());
                    return Some(control);
                }
                Ok(None) => continue,
                Err(e) => {
                    debug!("Strategy {} failed: {}", strategy.description(), e);
                    continue;
                }
            }
        }
        None
    }
}

impl<P: DetailPage> Default for StrategyChain<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves an affiliate share link on a loaded detail page.
pub struct ShareResolver {
    selectors: ShareSelectors,
    share_vocabulary: &'static [&'static str],
    copy_vocabulary: &'static [&'static str],
    short_timeout: Duration,
    pause: Duration,
}

impl ShareResolver {
    /// Creates a resolver with the site's selectors and default waits.
    pub fn new(site: Site) -> Self {
        Self {
            selectors: site.share_selectors(),
            share_vocabulary: site.share_vocabulary(),
            copy_vocabulary: site.copy_vocabulary(),
            short_timeout: Duration::from_secs(15),
            pause: Duration::from_secs(1),
        }
    }

    /// Overrides the bounded wait used for element lookups.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.short_timeout = timeout;
        self
    }

    /// Overrides the settle pause between interactions.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    fn chain<P: DetailPage>(&self) -> StrategyChain<P> {
        let mut chain = StrategyChain::new();
        chain
            .add(ByLabelXPath { xpath: self.selectors.share_button_xpath, timeout: self.short_timeout })
            .add(ByAttributeCss { css: self.selectors.share_button_css, timeout: self.short_timeout })
            .add(ByScriptQuery { vocabulary: self.share_vocabulary })
            .add(ByButtonScan { vocabulary: self.share_vocabulary });
        chain
    }

    /// Attempts the full share flow. Always returns a usable link: either a
    /// captured share URL or `listing_link` verbatim.
    pub async fn resolve<P: DetailPage>(&self, page: &P, listing_link: &str) -> String {
        let fallback = listing_link.to_string();

        // Park the viewport partway down; share controls sit below the fold
        let _ = page.scroll_to_fraction(1.0 / 3.0).await;
        tokio::time::sleep(self.pause).await;

        let Some(control) = self.chain().locate(page).await else {
            info!("Share control not found by any strategy; keeping the listing link");
            return fallback;
        };

        let _ = control.scroll_into_view().await;
        tokio::time::sleep(self.pause).await;

        // The click is not verified beyond proceeding to the modal wait
        if control.click().await.is_err() {
            debug!("Native click rejected, dispatching via script");
            let _ = control.click_via_script().await;
        }
        tokio::time::sleep(self.pause).await;

        let field_locator = Locator::css(self.selectors.link_field_css);
        let field = match page.wait_for_field(&field_locator, self.short_timeout).await {
            Ok(Some(field)) => field,
            Ok(None) => {
                warn!("Share modal did not appear; keeping the listing link");
                return fallback;
            }
            Err(e) => {
                warn!("Share modal wait failed ({}); keeping the listing link", e);
                return fallback;
            }
        };
        tokio::time::sleep(self.pause).await;

        let captured = self.capture(page, &field).await;

        // Best-effort dismissal, independent of the capture outcome
        let _ = page.send_escape().await;

        match captured {
            Some(link) => {
                debug!("Share link captured");
                link
            }
            None => {
                warn!("No usable share link captured; keeping the listing link");
                fallback
            }
        }
    }

    /// Capture order: copy control + clipboard first, then the link field's
    /// own value. Both are gated on the URL-scheme check.
    async fn capture<P: DetailPage>(&self, page: &P, field: &P::Control) -> Option<String> {
        if let Some(copy) = self.find_copy_control(page).await {
            let _ = copy.scroll_into_view().await;
            if copy.click().await.is_err() {
                let _ = copy.click_via_script().await;
            }
            tokio::time::sleep(self.pause).await;

            match page.read_clipboard().await {
                Ok(Some(link)) if is_share_url(&link) => {
                    debug!("Link captured via clipboard");
                    return Some(link.trim().to_string());
                }
                Ok(_) => debug!("Clipboard empty or not a URL"),
                Err(e) => debug!("Clipboard read failed: {}", e),
            }
        }

        match field.value().await {
            Ok(Some(value)) if is_share_url(&value) => {
                debug!("Link captured from the share field");
                Some(value.trim().to_string())
            }
            _ => None,
        }
    }

    async fn find_copy_control<P: DetailPage>(&self, page: &P) -> Option<P::Control> {
        let locator = Locator::css(self.selectors.copy_button_css);
        if let Ok(Some(control)) = page.find_clickable(&locator, self.short_timeout).await {
            return Some(control);
        }
        page.find_by_vocabulary(self.copy_vocabulary).await.ok().flatten()
    }
}
