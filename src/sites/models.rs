//! Data models for scraped product records.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// State of a field that is filled in by the detail pass.
///
/// The listing pass creates records with these fields `Pending`; the detail
/// pass replaces them exactly once. Keeping the states tagged (instead of
/// magic strings) lets match sites check exhaustiveness, while the serde
/// impls below map to the legacy spreadsheet sentinels so exported files
/// stay readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldState {
    /// Not yet attempted.
    Pending,
    /// Attempted, but the source element does not exist on the page.
    Unavailable,
    /// The collection attempt itself failed.
    Failed,
    /// Collected value.
    Resolved(String),
}

impl FieldState {
    const PENDING: &'static str = "pending";
    const UNAVAILABLE: &'static str = "not available";
    const FAILED: &'static str = "error collecting";

    /// True while the detail pass has not touched this field.
    pub fn is_pending(&self) -> bool {
        matches!(self, FieldState::Pending)
    }

    /// True if a value was actually collected.
    pub fn is_resolved(&self) -> bool {
        matches!(self, FieldState::Resolved(_))
    }

    /// Returns the resolved value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            FieldState::Resolved(v) => Some(v),
            _ => None,
        }
    }

    /// Spreadsheet-cell representation.
    pub fn as_cell(&self) -> &str {
        match self {
            FieldState::Pending => Self::PENDING,
            FieldState::Unavailable => Self::UNAVAILABLE,
            FieldState::Failed => Self::FAILED,
            FieldState::Resolved(v) => v,
        }
    }

    /// Parses a spreadsheet cell back into a state.
    pub fn from_cell(cell: &str) -> Self {
        match cell {
            Self::PENDING => FieldState::Pending,
            Self::UNAVAILABLE => FieldState::Unavailable,
            Self::FAILED => FieldState::Failed,
            other => FieldState::Resolved(other.to_string()),
        }
    }
}

impl fmt::Display for FieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cell())
    }
}

impl Serialize for FieldState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_cell())
    }
}

struct FieldStateVisitor;

impl Visitor<'_> for FieldStateVisitor {
    type Value = FieldState;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a field state string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldState, E> {
        Ok(FieldState::from_cell(v))
    }
}

impl<'de> Deserialize<'de> for FieldState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(FieldStateVisitor)
    }
}

/// One scraped product row.
///
/// Field order matches the exported column order. Every field has a defined
/// value as soon as the listing pass produces the record; extraction misses
/// fill in the configured default string rather than leaving a hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// 1-based position within the source page.
    pub id: usize,
    /// Category identifier taken from the listing URL.
    pub category: String,
    /// Product title.
    pub title: String,
    /// Pre-discount price, as displayed.
    pub original_price: String,
    /// Discounted price, as displayed.
    pub discount_price: String,
    /// Installment/financing note.
    pub installments: String,
    /// Review rating, as displayed.
    pub rating: String,
    /// Canonical product URL.
    pub link: String,
    /// Share link captured on the detail page; falls back to `link`.
    pub affiliate_link: FieldState,
    /// Card image URL.
    pub image_url: String,
    /// Bounded-length description from the detail page.
    pub description: FieldState,
}

impl ProductRecord {
    /// True when the captured affiliate link differs from the listing link.
    pub fn has_affiliate_link(&self) -> bool {
        match self.affiliate_link.value() {
            Some(v) => v != self.link,
            None => false,
        }
    }
}

/// Aggregate statistics for a finished run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: usize,
    pub with_affiliate_link: usize,
    pub with_description: usize,
}

impl RunSummary {
    /// Computes statistics over a set of records.
    pub fn from_records(records: &[ProductRecord]) -> Self {
        Self {
            total: records.len(),
            with_affiliate_link: records.iter().filter(|r| r.has_affiliate_link()).count(),
            with_description: records.iter().filter(|r| r.description.is_resolved()).count(),
        }
    }
}
