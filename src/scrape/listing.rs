//! Listing pass: load a deals page, scroll everything in, parse the cards.

use crate::browser::{ListingSurface, Locator, ScrollSurface};
use crate::scrape::scroll::{self, ScrollConfig};
use crate::sites::parser::ListingParser;
use crate::sites::{category_from_url, ProductRecord, Site};
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Collects every product card from one deals listing URL.
pub struct ListingPass {
    site: Site,
    wait: Duration,
    scroll: ScrollConfig,
    parser: ListingParser,
}

impl ListingPass {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            wait: Duration::from_secs(30),
            scroll: ScrollConfig::default(),
            parser: ListingParser::new(site),
        }
    }

    /// Overrides the structural wait for the first card.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollConfig) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_parser(mut self, parser: ListingParser) -> Self {
        self.parser = parser;
        self
    }

    /// Runs the pass against one listing URL.
    ///
    /// A page that never shows a single card within the wait is a structural
    /// failure and propagates as an error; a page that loads but parses to
    /// zero records is a valid (empty) result.
    pub async fn run<S>(&self, surface: &S, url: &str) -> Result<Vec<ProductRecord>>
    where
        S: ListingSurface + ScrollSurface,
    {
        let category = category_from_url(url);
        info!("Collecting {} listing for category '{}'", self.site, category);

        surface.goto(url).await?;
        surface
            .wait_for(&Locator::css(self.site.card_css()), self.wait)
            .await?;

        let outcome = scroll::load_all(surface, &self.scroll).await?;
        debug!(
            "Scroll finished after {} attempts (settled: {}, height: {})",
            outcome.attempts, outcome.settled, outcome.final_height
        );

        let html = surface.page_source().await?;
        let records = self.parser.parse_listing(&html, &category);

        if records.is_empty() {
            warn!("Page loaded but no product cards parsed from {}", url);
        } else {
            info!("Parsed {} products for category '{}'", records.len(), category);
        }
        Ok(records)
    }
}
