//! CSS/XPath selectors for the supported sites.
//!
//! All selectors used to parse listing cards and to drive the share-link
//! flow live here. Update this file when a site changes its markup.

use crate::sites::Site;
use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for Mercado Livre deal pages.
pub mod mercado_livre {
    use super::*;

    /// Product card container on the deals listing.
    pub static CARD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.andes-card").unwrap());

    /// Title/link anchor inside a card.
    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a.poly-component__title").unwrap());

    /// Strikethrough pre-discount price.
    pub static OLD_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("s.andes-money-amount--previous").unwrap());

    /// Current discounted price fraction.
    pub static NEW_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.andes-money-amount__fraction").unwrap());

    /// Installment note.
    pub static INSTALLMENTS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.poly-price__installments").unwrap());

    /// Card image. The real source sits in `data-src` until scrolled into view.
    pub static IMAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("img.poly-component__picture").unwrap());

    /// Review rating.
    pub static RATING: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.poly-reviews__rating").unwrap());

    /// Description block on the product detail page.
    pub static DESCRIPTION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".ui-pdp-description__content").unwrap());
}

/// Selectors for Amazon Brasil deal pages.
pub mod amazon_br {
    use super::*;

    /// Product card container on the goldbox page.
    pub static CARD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div[data-testid='product-card']").unwrap());

    /// Card link anchor.
    pub static LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[data-testid='product-card-link']").unwrap());

    /// Card image; its `alt` text doubles as the product title.
    pub static IMAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("img[class*='ProductCardImage-module__image']").unwrap());

    /// Current price (whole part).
    pub static NEW_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[class*='a-price-whole']").unwrap());

    /// Pre-discount price.
    pub static OLD_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[class*='a-text-price']").unwrap());

    /// Description block on the product detail page.
    pub static DESCRIPTION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#productDescription").unwrap());
}

/// Selector strings for the live share-link flow on a detail page.
///
/// These are raw strings (not compiled `Selector`s) because they are handed
/// to the WebDriver session, which does its own matching.
#[derive(Debug, Clone, Copy)]
pub struct ShareSelectors {
    /// Structural locator keyed on the control's visible label.
    pub share_button_xpath: &'static str,
    /// Attribute-based locator for the share control.
    pub share_button_css: &'static str,
    /// Copy-link control inside the share modal.
    pub copy_button_css: &'static str,
    /// Input/textarea carrying the generated link.
    pub link_field_css: &'static str,
}

impl Site {
    /// Returns the share-flow selectors for this site.
    pub fn share_selectors(&self) -> ShareSelectors {
        // Both sites render the Portuguese share UI; the attribute-based
        // locators cover the test-id variants seen on Mercado Livre.
        ShareSelectors {
            share_button_xpath: "//span[contains(text(), 'Compartilhar')]/ancestor::button",
            share_button_css: "button[data-testid='generate_link_button'], \
                               button[class*='share'], \
                               button[aria-label*='Compartilhar']",
            copy_button_css: "button[data-testid='copy-button__label_link'], \
                              button[class*='copy']",
            link_field_css: "textarea[data-testid='text-field__label_link'], \
                             textarea, input[type='text']",
        }
    }

    /// Raw CSS for the listing card container, for presence waits.
    pub fn card_css(&self) -> &'static str {
        match self {
            Site::MercadoLivre => "div.andes-card",
            Site::AmazonBr => "div[data-testid='product-card']",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        // Force evaluation of all lazy selectors to ensure they compile
        let _ = &*mercado_livre::CARD;
        let _ = &*mercado_livre::TITLE;
        let _ = &*mercado_livre::OLD_PRICE;
        let _ = &*mercado_livre::NEW_PRICE;
        let _ = &*mercado_livre::INSTALLMENTS;
        let _ = &*mercado_livre::IMAGE;
        let _ = &*mercado_livre::RATING;
        let _ = &*mercado_livre::DESCRIPTION;
        let _ = &*amazon_br::CARD;
        let _ = &*amazon_br::LINK;
        let _ = &*amazon_br::IMAGE;
        let _ = &*amazon_br::NEW_PRICE;
        let _ = &*amazon_br::OLD_PRICE;
        let _ = &*amazon_br::DESCRIPTION;
    }

    #[test]
    fn test_card_selector_matching() {
        let html = Html::parse_document(
            r#"<div class="andes-card">
                <a class="poly-component__title" href="/p/1">Produto</a>
            </div>"#,
        );

        let cards: Vec<_> = html.select(&mercado_livre::CARD).collect();
        assert_eq!(cards.len(), 1);

        let title = cards[0].select(&mercado_livre::TITLE).next().unwrap();
        assert_eq!(title.value().attr("href"), Some("/p/1"));
    }

    #[test]
    fn test_share_selectors_nonempty() {
        for site in Site::all() {
            let sel = site.share_selectors();
            assert!(sel.share_button_xpath.contains("Compartilhar"));
            assert!(!sel.share_button_css.is_empty());
            assert!(!sel.copy_button_css.is_empty());
            assert!(!sel.link_field_css.is_empty());
        }
    }
}
