//! deals-crawler - Deal listing scraper with affiliate share-link capture
//!
//! Drives a real Chrome session over WebDriver to collect deal listings from
//! Mercado Livre and Amazon Brasil, resolve affiliate share links per
//! product, and export the result as a spreadsheet. Ships an optional
//! fixed-coordinate macro replayer for posting the collected deals.

pub mod browser;
pub mod commands;
pub mod config;
pub mod export;
pub mod replay;
pub mod scrape;
pub mod sites;

pub use config::{Config, HeaderLocale};
pub use sites::models::{FieldState, ProductRecord, RunSummary};
pub use sites::Site;
