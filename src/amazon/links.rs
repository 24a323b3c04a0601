//! Product and affiliate short-link resolution.
//!
//! Detail-page URLs are handled by pattern extraction alone. Only URLs on a
//! short-link host touch the network: a `HEAD` that follows redirects first,
//! then a full `GET` (whose body may carry a canonical link) if that did not
//! land on a detail page.

use crate::amazon::models::Resolution;
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex_lite::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use wreq::Client;
use wreq_util::Emulation;

/// Hosts whose links are known redirectors to a product page.
pub const SHORT_LINK_HOSTS: &[&str] = &["amzn.to", "amzn.eu", "amzn.asia", "a.co"];

// Ids are either "B0" ASINs or ISBN-10s; arbitrary ten-character segments are not ids.
const ASIN_PATTERN: &str =
    r"(?i)/(?:dp|gp/product|gp/aw/d|product|exec/obidos/asin|o/asin|d)/(b0[a-z0-9]{8}|\d{9}[\dx])(?:[/?#;]|$)";

fn asin_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ASIN_PATTERN).ok()).as_ref()
}

/// Extracts an ASIN from a product URL's path without any network access.
///
/// Accepts absolute URLs and bare paths.
pub fn extract_id(url: &str) -> Option<String> {
    let re = asin_regex()?;
    let url = url.trim();

    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };

    re.captures(&path).and_then(|c| c.get(1)).map(|m| m.as_str().to_uppercase())
}

/// Finds `<link rel="canonical">` in an HTML page.
pub fn canonical_link(html: &str) -> Option<String> {
    let selector = Selector::parse(r#"link[rel="canonical"]"#).ok()?;
    Html::parse_document(html)
        .select(&selector)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(|href| href.trim().to_string())
}

/// A page fetched with redirects followed.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub body: String,
}

/// Redirect-following HTTP operations - enables mocking for tests.
#[async_trait]
pub trait RedirectFollower: Send + Sync {
    /// Follows redirects with `HEAD` requests and returns the final URL.
    async fn head(&self, url: &str) -> Result<String>;

    /// Follows redirects with `GET` requests and returns the final page.
    async fn get(&self, url: &str) -> Result<FetchedPage>;
}

/// [`RedirectFollower`] backed by a browser-emulating wreq client.
pub struct HttpFollower {
    client: Client,
}

impl HttpFollower {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(wreq::redirect::Policy::limited(10))
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(5));

        if let Some(proxy_url) = &config.proxy {
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        Ok(Self { client: builder.build().context("Failed to build HTTP client")? })
    }
}

#[async_trait]
impl RedirectFollower for HttpFollower {
    async fn head(&self, url: &str) -> Result<String> {
        debug!("HEAD {}", url);

        let response = self
            .client
            .head(url)
            .emulation(Emulation::Chrome131)
            .send()
            .await
            .context("Failed to send request")?;

        debug!("Response status: {}", response.status());
        Ok(response.uri().to_string())
    }

    async fn get(&self, url: &str) -> Result<FetchedPage> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        let final_url = response.uri().to_string();
        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        let body = response.text().await.context("Failed to read response body")?;
        Ok(FetchedPage { final_url, body })
    }
}

/// Turns product and short links into ASINs.
pub struct LinkResolver {
    follower: Box<dyn RedirectFollower>,
    short_hosts: Vec<String>,
}

impl LinkResolver {
    pub fn new(follower: Box<dyn RedirectFollower>) -> Self {
        Self { follower, short_hosts: SHORT_LINK_HOSTS.iter().map(|h| h.to_string()).collect() }
    }

    /// Builds a resolver with an HTTP follower and the configured extra short-link hosts.
    pub fn from_config(config: &Config) -> Result<Self> {
        let follower = HttpFollower::new(config)?;
        Ok(Self::new(Box::new(follower)).with_short_hosts(&config.short_link_hosts))
    }

    /// Adds hosts to treat as short-link domains.
    pub fn with_short_hosts<S: AsRef<str>>(mut self, hosts: &[S]) -> Self {
        for host in hosts {
            let host = host.as_ref().trim().to_lowercase();
            if !host.is_empty() && !self.short_hosts.contains(&host) {
                self.short_hosts.push(host);
            }
        }
        self
    }

    /// Returns true if `url` is on a recognized short-link host.
    pub fn is_short_link(&self, url: &str) -> bool {
        let parsed = Url::parse(url.trim()).ok();
        let host = match parsed.as_ref().and_then(|u| u.host_str()) {
            Some(host) => host.to_lowercase(),
            None => return false,
        };
        let host = host.trim_start_matches("www.");
        self.short_hosts.iter().any(|h| h == host)
    }

    /// Resolves `url` to an ASIN. Never fails; unresolved links come back with `id: None`.
    pub async fn resolve(&self, url: &str) -> Resolution {
        let url = url.trim();

        // A short link's path is a redirect code, never an item id
        if !self.is_short_link(url) {
            return match extract_id(url) {
                Some(id) => Resolution { id: Some(id), final_url: url.to_string() },
                None => {
                    debug!("Not a product or short link: {}", url);
                    Resolution::unresolved(url)
                }
            };
        }

        info!("Resolving short link: {}", url);

        match self.follower.head(url).await {
            Ok(final_url) => {
                if let Some(id) = extract_id(&final_url) {
                    return Resolution { id: Some(id), final_url };
                }
                debug!("HEAD landed on {} without an ASIN", final_url);
            }
            Err(e) => debug!("HEAD failed for {}: {:#}", url, e),
        }

        match self.follower.get(url).await {
            Ok(page) => {
                let id = extract_id(&page.final_url)
                    .or_else(|| canonical_link(&page.body).and_then(|href| extract_id(&href)));
                if id.is_some() {
                    return Resolution { id, final_url: page.final_url };
                }
                debug!("GET landed on {} without an ASIN", page.final_url);
            }
            Err(e) => warn!("Failed to resolve {}: {:#}", url, e),
        }

        Resolution::unresolved(url)
    }
}
