//! The scraping pipeline: listing pass, scroll-to-load controller,
//! detail pass, and the share-link resolver.

pub mod detail;
pub mod listing;
pub mod scroll;
pub mod share;

pub use detail::DetailPass;
pub use listing::ListingPass;
pub use scroll::{ScrollConfig, ScrollOutcome};
pub use share::ShareResolver;

use thiserror::Error;

/// Failures with a meaning beyond "the driver call failed".
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The expected page structure never appeared within the wait ceiling.
    /// Recovered at the page boundary: screenshot, zero records, next URL.
    #[error("expected element ({locator}) did not appear within {timeout_secs}s")]
    StructureTimeout { locator: String, timeout_secs: u64 },
}
