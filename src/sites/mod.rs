//! Site-specific modules: supported marketplaces, selectors, data models,
//! and the listing-page parser.

pub mod models;
pub mod parser;
pub mod selectors;

pub use models::{FieldState, ProductRecord, RunSummary};
pub use parser::ListingParser;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Supported deal-listing sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Site {
    #[default]
    MercadoLivre,
    AmazonBr,
}

impl Site {
    /// Returns the site domain.
    pub fn domain(&self) -> &'static str {
        match self {
            Site::MercadoLivre => "mercadolivre.com.br",
            Site::AmazonBr => "amazon.com.br",
        }
    }

    /// Returns the base URL for resolving relative links.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    /// Returns the default deals/offers listing URL.
    pub fn deals_url(&self) -> &'static str {
        match self {
            Site::MercadoLivre => "https://www.mercadolivre.com.br/ofertas",
            Site::AmazonBr => "https://www.amazon.com.br/gp/goldbox",
        }
    }

    /// Returns a short label used in output filenames.
    pub fn label(&self) -> &'static str {
        match self {
            Site::MercadoLivre => "mercadolivre",
            Site::AmazonBr => "amazon",
        }
    }

    /// Words that identify a share control in button text, aria-labels,
    /// or test ids. Both sites render Portuguese UI.
    pub fn share_vocabulary(&self) -> &'static [&'static str] {
        &["compartilhar", "share"]
    }

    /// Words that identify the copy-link control inside the share modal.
    pub fn copy_vocabulary(&self) -> &'static [&'static str] {
        &["copiar", "copy"]
    }

    /// Returns all supported sites.
    pub fn all() -> &'static [Site] {
        &[Site::MercadoLivre, Site::AmazonBr]
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::MercadoLivre => write!(f, "mercado-livre"),
            Site::AmazonBr => write!(f, "amazon-br"),
        }
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "mercado-livre" | "mercadolivre" | "ml" => Ok(Site::MercadoLivre),
            "amazon-br" | "amazon" | "amzn" => Ok(Site::AmazonBr),
            _ => Err(format!("Unknown site: {}. Use: mercado-livre, amazon-br", s)),
        }
    }
}

/// Extracts a category identifier from a listing URL.
///
/// Mercado Livre deal pages carry a `category` (or `container_id`) query
/// parameter; anything else falls back to a fixed placeholder.
pub fn category_from_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return "unknown-category".to_string();
    };

    let mut container_id = None;
    for (key, value) in parsed.query_pairs() {
        if key == "category" {
            return value.into_owned();
        }
        if key == "container_id" && container_id.is_none() {
            container_id = Some(value.into_owned());
        }
    }

    container_id.unwrap_or_else(|| "unknown-category".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_parsing() {
        assert_eq!("mercado-livre".parse::<Site>().unwrap(), Site::MercadoLivre);
        assert_eq!("ML".parse::<Site>().unwrap(), Site::MercadoLivre);
        assert_eq!("mercadolivre".parse::<Site>().unwrap(), Site::MercadoLivre);
        assert_eq!("amazon-br".parse::<Site>().unwrap(), Site::AmazonBr);
        assert_eq!("amazon".parse::<Site>().unwrap(), Site::AmazonBr);

        let err = "ebay".parse::<Site>().unwrap_err();
        assert!(err.contains("Unknown site"));
    }

    #[test]
    fn test_site_display_roundtrip() {
        for site in Site::all() {
            let parsed: Site = site.to_string().parse().unwrap();
            assert_eq!(parsed, *site);
        }
    }

    #[test]
    fn test_site_urls() {
        assert_eq!(Site::MercadoLivre.base_url(), "https://www.mercadolivre.com.br");
        assert!(Site::AmazonBr.deals_url().contains("goldbox"));
    }

    #[test]
    fn test_site_serde() {
        let json = serde_json::to_string(&Site::MercadoLivre).unwrap();
        assert_eq!(json, "\"mercado-livre\"");
        let parsed: Site = serde_json::from_str("\"amazon-br\"").unwrap();
        assert_eq!(parsed, Site::AmazonBr);
    }

    #[test]
    fn test_category_from_url() {
        let url = "https://www.mercadolivre.com.br/ofertas?category=MLB1367&container_id=MLB1279748-1";
        assert_eq!(category_from_url(url), "MLB1367");

        let url = "https://www.mercadolivre.com.br/ofertas?container_id=MLB1279748-1";
        assert_eq!(category_from_url(url), "MLB1279748-1");

        assert_eq!(
            category_from_url("https://www.amazon.com.br/gp/goldbox"),
            "unknown-category"
        );
        assert_eq!(category_from_url("not a url"), "unknown-category");
    }
}
