//! Scroll-to-load controller for pages that lazily render cards.
//!
//! A single unchanged height reading is not enough to stop: lazy content
//! can arrive later than one poll interval, so termination requires a
//! streak of non-growth readings. An attempt ceiling bounds the loop even
//! when the page keeps growing.

use crate::browser::ScrollSurface;
use anyhow::Result;
use std::time::Duration;
use tracing::debug;

/// Tuning for the scroll controller.
#[derive(Debug, Clone)]
pub struct ScrollConfig {
    /// Hard ceiling on scroll attempts.
    pub max_attempts: usize,
    /// Consecutive unchanged-height readings required to stop early.
    pub settle_streak: usize,
    /// Pause between scrolls, giving lazy content time to arrive.
    pub pause: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self { max_attempts: 30, settle_streak: 3, pause: Duration::from_millis(1500) }
    }
}

/// What the controller observed before stopping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Scroll attempts performed.
    pub attempts: usize,
    /// Last height reading.
    pub final_height: i64,
    /// True when the height streak settled; false when the ceiling hit.
    pub settled: bool,
}

/// Scrolls until the document stops growing, then resets to the top.
///
/// Later per-card work assumes a top-anchored viewport, so the reset runs
/// on every exit path.
pub async fn load_all<S: ScrollSurface + ?Sized>(
    surface: &S,
    config: &ScrollConfig,
) -> Result<ScrollOutcome> {
    let mut last_height = 0i64;
    let mut streak = 0usize;
    let mut attempts = 0usize;
    let mut settled = false;

    debug!("Scrolling to load content (max {} attempts)", config.max_attempts);

    while attempts < config.max_attempts {
        attempts += 1;
        surface.scroll_to_bottom().await?;
        tokio::time::sleep(config.pause).await;

        let height = surface.document_height().await?;
        if height == last_height {
            streak += 1;
            if streak >= config.settle_streak {
                debug!("Page height settled at {} after {} attempts", height, attempts);
                settled = true;
                last_height = height;
                break;
            }
        } else {
            streak = 0;
        }
        last_height = height;
    }

    if !settled {
        debug!("Scroll attempt ceiling reached at height {}", last_height);
    }

    surface.scroll_to_top().await?;
    Ok(ScrollOutcome { attempts, final_height: last_height, settled })
}
