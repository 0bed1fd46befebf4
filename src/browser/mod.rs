//! Browser session and the trait seams the scraping pipeline runs against.
//!
//! The pipeline never talks to thirtyfour directly; it is generic over the
//! traits below so every stage can be exercised against scripted fakes.

pub mod page;
pub mod session;

pub use page::{LiveControl, LivePage};
pub use session::{BrowserConfig, Session};

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// An element locator, mirroring the WebDriver location strategies in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(s: impl Into<String>) -> Self {
        Locator::Css(s.into())
    }

    pub fn xpath(s: impl Into<String>) -> Self {
        Locator::XPath(s.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css `{}`", s),
            Locator::XPath(s) => write!(f, "xpath `{}`", s),
        }
    }
}

/// A located element that can be interacted with.
#[async_trait]
pub trait PageControl: Send + Sync {
    /// Scrolls the element to the viewport center.
    async fn scroll_into_view(&self) -> Result<()>;

    /// Native click.
    async fn click(&self) -> Result<()>;

    /// Script-dispatched click, for controls that reject native clicks.
    async fn click_via_script(&self) -> Result<()>;

    /// Visible text content.
    async fn text(&self) -> Result<String>;

    /// The `value` attribute, if present.
    async fn value(&self) -> Result<Option<String>>;
}

/// Page-level operations needed by the listing and detail passes.
#[async_trait]
pub trait ListingSurface: Send + Sync {
    /// Navigates to a URL.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Polls until the locator matches at least one element.
    ///
    /// Errors with [`crate::scrape::ScrapeError::StructureTimeout`] when the
    /// ceiling is reached - the page-level structural failure signal.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Snapshot of the current DOM as HTML.
    async fn page_source(&self) -> Result<String>;

    /// Saves a full-page screenshot.
    async fn screenshot(&self, path: &Path) -> Result<()>;
}

/// Scroll operations for the scroll-to-load controller.
#[async_trait]
pub trait ScrollSurface: Send + Sync {
    async fn scroll_to_bottom(&self) -> Result<()>;

    async fn scroll_to_top(&self) -> Result<()>;

    /// Current `document.body.scrollHeight`.
    async fn document_height(&self) -> Result<i64>;
}

/// Operations the share-link resolver needs on a loaded detail page.
#[async_trait]
pub trait DetailPage: Send + Sync {
    type Control: PageControl;

    /// Finds one clickable element, polling up to `timeout`. `Ok(None)` on
    /// timeout - absence is an expected outcome, not an error.
    async fn find_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<Self::Control>>;

    /// DOM-wide script query: first button whose text, aria-label, or
    /// test id contains any vocabulary word.
    async fn find_by_vocabulary(&self, vocabulary: &[&str]) -> Result<Option<Self::Control>>;

    /// Every button element on the page, for the brute-force scan.
    async fn buttons(&self) -> Result<Vec<Self::Control>>;

    /// Waits for a link-bearing field to appear. `Ok(None)` on timeout.
    async fn wait_for_field(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<Self::Control>>;

    /// Reads the clipboard through the browser.
    async fn read_clipboard(&self) -> Result<Option<String>>;

    /// Sends Escape to the page body.
    async fn send_escape(&self) -> Result<()>;

    /// Scrolls to a fraction of the document height.
    async fn scroll_to_fraction(&self, fraction: f64) -> Result<()>;
}
