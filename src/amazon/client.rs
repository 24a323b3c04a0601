//! Signed HTTP client for the PA-API GetItems operation.

use crate::amazon::error::ApiError;
use crate::amazon::parser::{self, GetItemsOutcome};
use crate::amazon::signer::{Signer, CONTENT_ENCODING, CONTENT_TYPE, GET_ITEMS};
use crate::config::{Config, Credentials};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;

/// Maximum number of item ids GetItems accepts per request.
pub const MAX_ITEMS_PER_REQUEST: usize = 10;

/// Resources requested for every item.
pub const RESOURCES: &[&str] = &[
    "Images.Primary.Large",
    "Images.Primary.Medium",
    "ItemInfo.Title",
    "Offers.Listings.Price",
    "CustomerReviews.Count",
    "CustomerReviews.StarRating",
];

const DEFAULT_USER_AGENT: &str = concat!("amz-enrich/", env!("CARGO_PKG_VERSION"));

/// Trait for GetItems calls - enables mocking for tests.
#[async_trait]
pub trait GetItemsApi: Send + Sync {
    /// Looks up at most [`MAX_ITEMS_PER_REQUEST`] ids in one signed request.
    async fn get_items(
        &self,
        credentials: &Credentials,
        item_ids: &[String],
    ) -> Result<GetItemsOutcome, ApiError>;
}

/// JSON body of a GetItems request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemsRequest<'a> {
    pub marketplace: &'a str,
    pub partner_tag: &'a str,
    pub partner_type: &'a str,
    pub item_ids: &'a [String],
    pub resources: &'a [&'a str],
}

impl<'a> GetItemsRequest<'a> {
    pub fn new(credentials: &'a Credentials, item_ids: &'a [String]) -> Self {
        Self {
            marketplace: credentials.marketplace.domain(),
            partner_tag: &credentials.partner_tag,
            partner_type: "Associates",
            item_ids,
            resources: RESOURCES,
        }
    }
}

/// PA-API HTTP client.
pub struct PaapiClient {
    client: Client,
    signer: Signer,
    base_url: Option<String>,
}

impl PaapiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None)
    }

    /// Creates a new client with an optional custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(5));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { client, signer: Signer::new(), base_url })
    }

    fn endpoint(&self, credentials: &Credentials) -> String {
        let base = self.base_url.clone().unwrap_or_else(|| format!("https://{}", credentials.host));
        format!("{}{}", base.trim_end_matches('/'), GET_ITEMS.path)
    }
}

#[async_trait]
impl GetItemsApi for PaapiClient {
    async fn get_items(
        &self,
        credentials: &Credentials,
        item_ids: &[String],
    ) -> Result<GetItemsOutcome, ApiError> {
        let body = serde_json::to_string(&GetItemsRequest::new(credentials, item_ids))
            .map_err(|e| ApiError::Malformed(format!("could not encode request: {}", e)))?;
        let signed = self.signer.sign(&GET_ITEMS, body.as_bytes(), credentials, Utc::now())?;
        let url = self.endpoint(credentials);

        info!("GetItems: {} ids", item_ids.len());
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("content-encoding", CONTENT_ENCODING)
            .header("content-type", CONTENT_TYPE)
            .header("host", credentials.host.as_str())
            .header("x-amz-date", signed.amz_date.as_str())
            .header("x-amz-target", signed.target)
            .header("authorization", signed.authorization.as_str())
            .header("user-agent", credentials.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {}", status);

        let text = response.text().await?;

        if status == 429 {
            warn!("Rate limited (429) by PA-API");
            return Err(ApiError::RateLimited(status.to_string()));
        }

        if !status.is_success() {
            let error = parser::parse_error_body(&text);
            let throttled = error
                .as_ref()
                .and_then(|e| parser::throttle_code(std::slice::from_ref(e)));
            if let Some(code) = throttled {
                return Err(ApiError::RateLimited(code.to_string()));
            }
            let message = error
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_else(|| status.to_string());
            return Err(ApiError::Provider { status: status.as_u16(), message });
        }

        parser::parse_get_items(&text)
    }
}
