//! CLI command implementations.

pub mod scrape;

#[cfg(feature = "input")]
pub mod replay;

pub use scrape::ScrapeCommand;

#[cfg(feature = "input")]
pub use replay::{ProbeCommand, ReplayCommand};
