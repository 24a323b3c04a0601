//! Data models for resolved items, prices, and link resolutions.

use crate::amazon::marketplace::Marketplace;
use serde::{Deserialize, Serialize};

/// One resolved product as returned by GetItems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Amazon Standard Identification Number
    pub asin: String,
    /// Product title
    pub title: Option<String>,
    /// Detail page URL (already carries the partner tag)
    pub detail_page_url: Option<String>,
    /// Primary image URL, large variant preferred
    pub image_url: Option<String>,
    /// Price of the first offer listing
    pub price: Option<Price>,
    /// Star rating (0.0 - 5.0)
    pub rating: Option<f32>,
    /// Number of customer reviews
    pub review_count: Option<u32>,
}

impl ItemSummary {
    /// Creates a summary with only the identifier set.
    pub fn new(asin: impl Into<String>) -> Self {
        Self {
            asin: asin.into(),
            title: None,
            detail_page_url: None,
            image_url: None,
            price: None,
            rating: None,
            review_count: None,
        }
    }

    /// Returns the numeric price amount if available.
    pub fn amount(&self) -> Option<f64> {
        self.price.as_ref().and_then(|p| p.amount)
    }

    /// Returns the detail page URL, or a tagged canonical URL when the provider omitted it.
    pub fn link(&self, marketplace: Marketplace, partner_tag: &str) -> String {
        self.detail_page_url
            .clone()
            .unwrap_or_else(|| affiliate_url(marketplace, &self.asin, partner_tag))
    }
}

/// Offer price as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// Display string, e.g. "$29.99"
    pub display: Option<String>,
    /// Numeric amount
    pub amount: Option<f64>,
    /// Currency code (USD, EUR, etc.)
    pub currency: Option<String>,
}

/// Outcome of resolving a product or short link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Extracted ASIN, if any
    pub id: Option<String>,
    /// URL after redirects (or the input URL when nothing was followed)
    pub final_url: String,
}

impl Resolution {
    pub fn unresolved(url: impl Into<String>) -> Self {
        Self { id: None, final_url: url.into() }
    }
}

/// Returns true if `asin` is 10 ASCII alphanumeric characters.
pub fn is_valid_asin(asin: &str) -> bool {
    asin.len() == 10 && asin.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Builds a canonical tagged detail page URL.
pub fn affiliate_url(marketplace: Marketplace, asin: &str, partner_tag: &str) -> String {
    format!("{}/dp/{}?tag={}", marketplace.base_url(), asin, urlencoding::encode(partner_tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_summary() -> ItemSummary {
        ItemSummary {
            asin: "B08N5WRWNW".to_string(),
            title: Some("Test Product".to_string()),
            detail_page_url: None,
            image_url: None,
            price: Some(Price {
                display: Some("$29.99".to_string()),
                amount: Some(29.99),
                currency: Some("USD".to_string()),
            }),
            rating: Some(4.5),
            review_count: Some(120),
        }
    }

    #[test]
    fn test_asin_validation() {
        assert!(is_valid_asin("B08N5WRWNW"));
        assert!(is_valid_asin("0316769487"));
        assert!(!is_valid_asin("B08N5"));
        assert!(!is_valid_asin("B08N5-WRWNW"));
        assert!(!is_valid_asin("TOOLONGASIN12345"));
        assert!(!is_valid_asin(""));
    }

    #[test]
    fn test_affiliate_url() {
        assert_eq!(
            affiliate_url(Marketplace::Us, "B08N5WRWNW", "blog-20"),
            "https://www.amazon.com/dp/B08N5WRWNW?tag=blog-20"
        );
        assert_eq!(
            affiliate_url(Marketplace::De, "B08N5WRWNW", "a b"),
            "https://www.amazon.de/dp/B08N5WRWNW?tag=a%20b"
        );
    }

    #[test]
    fn test_link_prefers_detail_page_url() {
        let mut summary = make_test_summary();
        assert_eq!(
            summary.link(Marketplace::Us, "blog-20"),
            "https://www.amazon.com/dp/B08N5WRWNW?tag=blog-20"
        );

        summary.detail_page_url = Some("https://www.amazon.com/dp/B08N5WRWNW?tag=x".to_string());
        assert_eq!(
            summary.link(Marketplace::Us, "blog-20"),
            "https://www.amazon.com/dp/B08N5WRWNW?tag=x"
        );
    }

    #[test]
    fn test_amount() {
        assert_eq!(make_test_summary().amount(), Some(29.99));
        assert!(ItemSummary::new("B08N5WRWNW").amount().is_none());
    }

    #[test]
    fn test_summary_serde() {
        let summary = make_test_summary();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("B08N5WRWNW"));

        let parsed: ItemSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_resolution_unresolved() {
        let r = Resolution::unresolved("https://example.com/x");
        assert!(r.id.is_none());
        assert_eq!(r.final_url, "https://example.com/x");
    }
}
