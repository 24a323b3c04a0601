//! Parser for GetItems JSON responses.

use crate::amazon::error::ApiError;
use crate::amazon::models::{ItemSummary, Price};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Provider error codes that mean "slow down".
const THROTTLE_CODES: &[&str] = &["TooManyRequests", "RequestThrottled"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetItemsResponse {
    #[serde(default)]
    items_result: Option<ItemsResult>,
    #[serde(default)]
    errors: Vec<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResult {
    // Kept untyped so one bad item cannot fail the whole response.
    #[serde(default)]
    items: Vec<Value>,
}

/// One entry of the top-level `Errors` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawItem {
    #[serde(rename = "ASIN")]
    asin: String,
    #[serde(rename = "DetailPageURL")]
    detail_page_url: Option<String>,
    images: Option<Images>,
    item_info: Option<ItemInfo>,
    offers: Option<Offers>,
    customer_reviews: Option<CustomerReviews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Images {
    primary: Option<ImageSet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageSet {
    large: Option<Image>,
    medium: Option<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemInfo {
    title: Option<DisplayValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DisplayValue {
    display_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Offers {
    #[serde(default)]
    listings: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Listing {
    price: Option<RawPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPrice {
    display_amount: Option<String>,
    amount: Option<f64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CustomerReviews {
    star_rating: Option<StarRating>,
    count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StarRating {
    value: Option<f32>,
}

/// Items found in a GetItems response, plus any per-item provider errors.
#[derive(Debug, Default)]
pub struct GetItemsOutcome {
    pub items: Vec<ItemSummary>,
    pub errors: Vec<ProviderErrorBody>,
    /// Some ids were refused for throttling; the items above are still good.
    pub throttled: bool,
}

/// Parses a 2xx GetItems body.
///
/// Individual items that fail to parse are skipped. A body with no
/// `ItemsResult` is still a valid outcome (every requested id was rejected).
/// A throttle code with no usable items is [`ApiError::RateLimited`]; with
/// items it only sets [`GetItemsOutcome::throttled`].
pub fn parse_get_items(body: &str) -> Result<GetItemsOutcome, ApiError> {
    let response: GetItemsResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;

    let throttled = throttle_code(&response.errors).map(str::to_string);

    let mut outcome = GetItemsOutcome {
        items: Vec::new(),
        errors: response.errors,
        throttled: throttled.is_some(),
    };

    for raw in response.items_result.map(|r| r.items).unwrap_or_default() {
        match serde_json::from_value::<RawItem>(raw) {
            Ok(item) => {
                let summary = into_summary(item);
                trace!("Parsed item: {}", summary.asin);
                outcome.items.push(summary);
            }
            Err(e) => warn!("Skipping malformed item: {}", e),
        }
    }

    if let Some(code) = throttled {
        if outcome.items.is_empty() {
            return Err(ApiError::RateLimited(code));
        }
        warn!("Partially throttled response ({}): kept {} items", code, outcome.items.len());
    }

    for error in &outcome.errors {
        debug!("PA-API item error {}: {}", error.code, error.message);
    }

    Ok(outcome)
}

/// Reads the first error out of a non-2xx body, if the body has the usual shape.
pub fn parse_error_body(body: &str) -> Option<ProviderErrorBody> {
    serde_json::from_str::<GetItemsResponse>(body).ok()?.errors.into_iter().next()
}

/// Returns the throttling code among `errors`, if any.
pub fn throttle_code(errors: &[ProviderErrorBody]) -> Option<&str> {
    errors.iter().map(|e| e.code.as_str()).find(|code| THROTTLE_CODES.contains(code))
}

fn into_summary(item: RawItem) -> ItemSummary {
    let image_url = item
        .images
        .and_then(|i| i.primary)
        .and_then(|p| p.large.and_then(|l| l.url).or_else(|| p.medium.and_then(|m| m.url)));

    let title = item.item_info.and_then(|i| i.title).and_then(|t| t.display_value);

    let price = item
        .offers
        .and_then(|o| o.listings.into_iter().next())
        .and_then(|l| l.price)
        .map(|p| Price { display: p.display_amount, amount: p.amount, currency: p.currency });

    let (rating, review_count) = match item.customer_reviews {
        Some(reviews) => {
            (reviews.star_rating.and_then(|s| s.value).map(|v| v.clamp(0.0, 5.0)), reviews.count)
        }
        None => (None, None),
    };

    ItemSummary {
        asin: item.asin.trim().to_uppercase(),
        title,
        detail_page_url: item.detail_page_url,
        image_url,
        price,
        rating,
        review_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RESPONSE: &str = r#"{
        "ItemsResult": {
            "Items": [
                {
                    "ASIN": "B08N5WRWNW",
                    "DetailPageURL": "https://www.amazon.com/dp/B08N5WRWNW?tag=blog-20",
                    "Images": {
                        "Primary": {
                            "Large": { "URL": "https://m.media-amazon.com/images/I/large.jpg", "Height": 500, "Width": 500 },
                            "Medium": { "URL": "https://m.media-amazon.com/images/I/medium.jpg" }
                        }
                    },
                    "ItemInfo": { "Title": { "DisplayValue": "Echo Dot (4th Gen)", "Label": "Title" } },
                    "Offers": {
                        "Listings": [
                            { "Price": { "Amount": 49.99, "Currency": "USD", "DisplayAmount": "$49.99" } },
                            { "Price": { "Amount": 59.99, "Currency": "USD", "DisplayAmount": "$59.99" } }
                        ]
                    },
                    "CustomerReviews": { "Count": 12345, "StarRating": { "Value": 4.7 } }
                },
                {
                    "ASIN": "b09hmz6s1y",
                    "Images": { "Primary": { "Medium": { "URL": "https://m.media-amazon.com/images/I/only-medium.jpg" } } }
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_full_item() {
        let outcome = parse_get_items(FULL_RESPONSE).unwrap();
        assert_eq!(outcome.items.len(), 2);
        assert!(outcome.errors.is_empty());

        let item = &outcome.items[0];
        assert_eq!(item.asin, "B08N5WRWNW");
        assert_eq!(item.title.as_deref(), Some("Echo Dot (4th Gen)"));
        assert_eq!(
            item.detail_page_url.as_deref(),
            Some("https://www.amazon.com/dp/B08N5WRWNW?tag=blog-20")
        );
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/large.jpg")
        );

        let price = item.price.as_ref().unwrap();
        assert_eq!(price.display.as_deref(), Some("$49.99"));
        assert_eq!(price.amount, Some(49.99));
        assert_eq!(price.currency.as_deref(), Some("USD"));

        assert_eq!(item.rating, Some(4.7));
        assert_eq!(item.review_count, Some(12345));
    }

    #[test]
    fn test_parse_sparse_item() {
        let outcome = parse_get_items(FULL_RESPONSE).unwrap();
        let item = &outcome.items[1];

        assert_eq!(item.asin, "B09HMZ6S1Y");
        assert!(item.title.is_none());
        assert!(item.price.is_none());
        assert!(item.rating.is_none());
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/only-medium.jpg")
        );
    }

    #[test]
    fn test_malformed_item_is_skipped() {
        let body = r#"{
            "ItemsResult": {
                "Items": [
                    { "DetailPageURL": "https://www.amazon.com/dp/NOASIN" },
                    { "ASIN": "B000000001", "CustomerReviews": { "Count": "many" } },
                    { "ASIN": "B000000002" }
                ]
            }
        }"#;

        let outcome = parse_get_items(body).unwrap();
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].asin, "B000000002");
    }

    #[test]
    fn test_partial_errors_are_kept() {
        let body = r#"{
            "Errors": [
                { "Code": "InvalidParameterValue", "Message": "The ItemId B000000000 provided in the request is invalid." }
            ],
            "ItemsResult": { "Items": [ { "ASIN": "B000000002" } ] }
        }"#;

        let outcome = parse_get_items(body).unwrap();
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, "InvalidParameterValue");
    }

    #[test]
    fn test_errors_only_body_is_empty_outcome() {
        let body = r#"{ "Errors": [ { "Code": "ItemNotAccessible", "Message": "nope" } ] }"#;
        let outcome = parse_get_items(body).unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_throttle_error_is_rate_limited() {
        let body = r#"{ "Errors": [ { "Code": "TooManyRequests", "Message": "slow down" } ] }"#;
        let err = parse_get_items(body).unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_throttle_error_keeps_parsed_items() {
        let body = r#"{
            "Errors": [ { "Code": "RequestThrottled", "Message": "slow down" } ],
            "ItemsResult": { "Items": [ { "ASIN": "B000000002" } ] }
        }"#;

        let outcome = parse_get_items(body).unwrap();
        assert!(outcome.throttled);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].asin, "B000000002");
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_get_items("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{ "__type": "com.amazon.paapi5#TooManyRequestsException",
                        "Errors": [ { "Code": "TooManyRequests", "Message": "The request was denied due to request throttling." } ] }"#;
        let error = parse_error_body(body).unwrap();
        assert_eq!(error.code, "TooManyRequests");

        assert!(parse_error_body("not json").is_none());
        assert!(parse_error_body("{}").is_none());
    }
}
