//! Listing-page parser: turns a DOM snapshot into product records.
//!
//! Every field is extracted independently with a fallback default, so a
//! card missing a price or rating still yields a well-formed record.

use crate::sites::models::{FieldState, ProductRecord};
use crate::sites::selectors::{amazon_br, mercado_livre};
use crate::sites::Site;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

/// Default cell value for a field whose element is missing.
pub const MISSING: &str = "not found";

/// Extracts the text content of the first match, or `default`.
pub fn extract_text(card: &ElementRef, selector: &Selector, default: &str) -> String {
    match card.select(selector).next() {
        Some(element) => {
            let text: String = element.text().collect();
            let text = text.trim().replace('\n', " ");
            if text.is_empty() {
                default.to_string()
            } else {
                text
            }
        }
        None => default.to_string(),
    }
}

/// Extracts an attribute of the first match, or `default`.
pub fn extract_attr(card: &ElementRef, selector: &Selector, attr: &str, default: &str) -> String {
    card.select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Extracts `primary`, falling back to `secondary`, then to `default`.
///
/// Lazy-loaded images stage the real source in a non-standard attribute
/// until scroll brings them into view; the fallback order is fixed.
pub fn extract_attr_with_fallback(
    card: &ElementRef,
    selector: &Selector,
    primary: &str,
    secondary: &str,
    default: &str,
) -> String {
    let value = extract_attr(card, selector, primary, default);
    if value != default {
        return value;
    }
    extract_attr(card, selector, secondary, default)
}

/// Parses listing pages for one site.
pub struct ListingParser {
    site: Site,
    missing: String,
}

impl ListingParser {
    /// Creates a parser for the given site with the default miss sentinel.
    pub fn new(site: Site) -> Self {
        Self::with_default(site, MISSING)
    }

    /// Creates a parser with a custom miss sentinel.
    pub fn with_default(site: Site, missing: impl Into<String>) -> Self {
        Self { site, missing: missing.into() }
    }

    /// Parses all product cards out of a listing-page snapshot, in DOM order.
    ///
    /// Zero cards is a legitimate result (no deals right now); structural
    /// failures are caught earlier, when the container wait times out.
    pub fn parse_listing(&self, html: &str, category: &str) -> Vec<ProductRecord> {
        let document = Html::parse_document(html);
        let card_selector = match self.site {
            Site::MercadoLivre => &*mercado_livre::CARD,
            Site::AmazonBr => &*amazon_br::CARD,
        };

        let mut records = Vec::new();
        for (idx, card) in document.select(card_selector).enumerate() {
            let record = match self.site {
                Site::MercadoLivre => self.parse_mercado_livre_card(idx + 1, &card, category),
                Site::AmazonBr => self.parse_amazon_card(idx + 1, &card, category),
            };
            trace!("Parsed card {}: {}", record.id, record.title);
            records.push(record);
        }

        debug!("Parsed {} product cards (category: {})", records.len(), category);
        records
    }

    fn parse_mercado_livre_card(
        &self,
        id: usize,
        card: &ElementRef,
        category: &str,
    ) -> ProductRecord {
        let missing = self.missing.as_str();
        ProductRecord {
            id,
            category: category.to_string(),
            title: extract_text(card, &mercado_livre::TITLE, missing),
            original_price: extract_text(card, &mercado_livre::OLD_PRICE, missing),
            discount_price: extract_text(card, &mercado_livre::NEW_PRICE, missing),
            installments: extract_text(card, &mercado_livre::INSTALLMENTS, missing),
            rating: extract_text(card, &mercado_livre::RATING, missing),
            link: extract_attr(card, &mercado_livre::TITLE, "href", missing),
            affiliate_link: FieldState::Pending,
            image_url: extract_attr_with_fallback(
                card,
                &mercado_livre::IMAGE,
                "src",
                "data-src",
                missing,
            ),
            description: FieldState::Pending,
        }
    }

    fn parse_amazon_card(&self, id: usize, card: &ElementRef, category: &str) -> ProductRecord {
        let missing = self.missing.as_str();

        // The goldbox card has no text title; the image alt carries it.
        let title = extract_attr(card, &amazon_br::IMAGE, "alt", missing);
        let link = extract_attr(card, &amazon_br::LINK, "href", missing);
        let link = if link == missing { link } else { self.normalize_link(&link) };

        ProductRecord {
            id,
            category: category.to_string(),
            title,
            original_price: extract_text(card, &amazon_br::OLD_PRICE, missing),
            discount_price: extract_text(card, &amazon_br::NEW_PRICE, missing),
            installments: missing.to_string(),
            rating: missing.to_string(),
            link,
            affiliate_link: FieldState::Pending,
            image_url: extract_attr_with_fallback(
                card,
                &amazon_br::IMAGE,
                "src",
                "data-src",
                missing,
            ),
            description: FieldState::Pending,
        }
    }

    /// Strips tracking query parameters and resolves relative links.
    fn normalize_link(&self, link: &str) -> String {
        let link = link.split('?').next().unwrap_or(link);
        if link.starts_with('/') {
            format!("{}{}", self.site.base_url(), link)
        } else {
            link.to_string()
        }
    }
}
