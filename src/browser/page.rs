//! Trait implementations over a live thirtyfour session.

use crate::browser::session::STEALTH_SCRIPT;
use crate::browser::{DetailPage, ListingSurface, Locator, PageControl, ScrollSurface};
use crate::scrape::ScrapeError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use thirtyfour::prelude::*;
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const CLIPBOARD_SCRIPT: &str = r#"
const done = arguments[arguments.length - 1];
navigator.clipboard.readText().then(done).catch(() => done(null));
"#;

const VOCABULARY_SCRIPT: &str = r#"
const words = arguments[0];
const hit = Array.from(document.querySelectorAll('button')).find((btn) => {
    const text = (btn.textContent || '').toLowerCase();
    const aria = (btn.getAttribute('aria-label') || '').toLowerCase();
    const testId = (btn.getAttribute('data-testid') || '').toLowerCase();
    return words.some((w) => text.includes(w) || aria.includes(w) || testId.includes(w));
});
return hit || null;
"#;

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::Css(s) => By::Css(s.as_str()),
        Locator::XPath(s) => By::XPath(s.as_str()),
    }
}

/// One browser window, seen through the pipeline traits.
pub struct LivePage {
    driver: WebDriver,
}

impl LivePage {
    pub fn new(driver: WebDriver) -> Self {
        Self { driver }
    }

    async fn poll_find(&self, by: By, timeout: Duration, clickable: bool) -> Option<WebElement> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(element) = self.driver.find(by.clone()).await {
                if !clickable || element.is_clickable().await.unwrap_or(false) {
                    return Some(element);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn control(&self, element: WebElement) -> LiveControl {
        LiveControl { driver: self.driver.clone(), element }
    }
}

#[async_trait]
impl ListingSurface for LivePage {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.driver.goto(url).await.with_context(|| format!("failed to open {}", url))?;
        // Fingerprint masking has to be reapplied on every document
        let _ = self.driver.execute(STEALTH_SCRIPT, vec![]).await;
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        trace!("Waiting up to {:?} for {}", timeout, locator);
        match self.poll_find(to_by(locator), timeout, false).await {
            Some(_) => Ok(()),
            None => Err(ScrapeError::StructureTimeout {
                locator: locator.to_string(),
                timeout_secs: timeout.as_secs(),
            }
            .into()),
        }
    }

    async fn page_source(&self) -> Result<String> {
        self.driver.source().await.context("failed to read page source")
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.driver
            .screenshot(path)
            .await
            .with_context(|| format!("failed to save screenshot to {}", path.display()))
    }
}

#[async_trait]
impl ScrollSurface for LivePage {
    async fn scroll_to_bottom(&self) -> Result<()> {
        self.driver
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await
            .context("scroll to bottom failed")?;
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        self.driver
            .execute("window.scrollTo(0, 0);", vec![])
            .await
            .context("scroll to top failed")?;
        Ok(())
    }

    async fn document_height(&self) -> Result<i64> {
        let ret = self
            .driver
            .execute("return document.body.scrollHeight;", vec![])
            .await
            .context("failed to read document height")?;
        ret.convert().context("document height was not a number")
    }
}

#[async_trait]
impl DetailPage for LivePage {
    type Control = LiveControl;

    async fn find_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<LiveControl>> {
        Ok(self.poll_find(to_by(locator), timeout, true).await.map(|e| self.control(e)))
    }

    async fn find_by_vocabulary(&self, vocabulary: &[&str]) -> Result<Option<LiveControl>> {
        let ret = self
            .driver
            .execute(VOCABULARY_SCRIPT, vec![json!(vocabulary)])
            .await
            .context("vocabulary query script failed")?;

        if ret.json().is_null() {
            return Ok(None);
        }
        let element = ret.element().context("vocabulary query returned a non-element")?;
        Ok(Some(self.control(element)))
    }

    async fn buttons(&self) -> Result<Vec<LiveControl>> {
        let elements =
            self.driver.find_all(By::Tag("button")).await.context("button scan failed")?;
        Ok(elements.into_iter().map(|e| self.control(e)).collect())
    }

    async fn wait_for_field(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<LiveControl>> {
        Ok(self.poll_find(to_by(locator), timeout, false).await.map(|e| self.control(e)))
    }

    async fn read_clipboard(&self) -> Result<Option<String>> {
        let ret = self
            .driver
            .execute_async(CLIPBOARD_SCRIPT, vec![])
            .await
            .context("clipboard read script failed")?;
        ret.convert().context("clipboard read returned a non-string")
    }

    async fn send_escape(&self) -> Result<()> {
        let body = self.driver.find(By::Tag("body")).await.context("page has no body")?;
        body.send_keys(Key::Escape + "").await.context("failed to send escape")?;
        Ok(())
    }

    async fn scroll_to_fraction(&self, fraction: f64) -> Result<()> {
        self.driver
            .execute(
                "window.scrollTo(0, document.body.scrollHeight * arguments[0]);",
                vec![json!(fraction)],
            )
            .await
            .context("fractional scroll failed")?;
        Ok(())
    }
}

/// A located element bound to the live session.
pub struct LiveControl {
    driver: WebDriver,
    element: WebElement,
}

#[async_trait]
impl PageControl for LiveControl {
    async fn scroll_into_view(&self) -> Result<()> {
        self.element.scroll_into_view().await.context("scroll into view failed")
    }

    async fn click(&self) -> Result<()> {
        self.element.click().await.context("native click failed")
    }

    async fn click_via_script(&self) -> Result<()> {
        self.driver
            .execute("arguments[0].click();", vec![self.element.to_json()?])
            .await
            .context("script click failed")?;
        Ok(())
    }

    async fn text(&self) -> Result<String> {
        self.element.text().await.context("failed to read element text")
    }

    async fn value(&self) -> Result<Option<String>> {
        self.element.attr("value").await.context("failed to read element value")
    }
}
