//! Batch item lookups: dedupe, cache, chunk, sign, merge.
//!
//! [`ItemService::get_summaries`] never fails. An id is either present in the
//! returned map or it is not; upstream failures only show up in the logs and
//! as short-lived negative cache entries.

use crate::amazon::client::{GetItemsApi, PaapiClient, MAX_ITEMS_PER_REQUEST};
use crate::amazon::models::{is_valid_asin, ItemSummary};
use crate::cache::{Cached, Lookup, MemoryCache, SummaryCache};
use crate::config::{Config, Credentials};
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning knobs for [`ItemService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// TTL for resolved items
    pub positive_ttl: Duration,
    /// TTL for absent items and failed chunks
    pub negative_ttl: Duration,
    /// Pause after a rate-limited chunk
    pub rate_limit_backoff: Duration,
    /// Ids per upstream request
    pub batch_size: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ServiceOptions {
    fn from(config: &Config) -> Self {
        Self {
            positive_ttl: config.positive_ttl(),
            negative_ttl: config.negative_ttl(),
            rate_limit_backoff: config.rate_limit_backoff(),
            batch_size: MAX_ITEMS_PER_REQUEST,
        }
    }
}

/// Entry point for bulk item lookups.
pub struct ItemService {
    credentials: Option<Credentials>,
    api: Box<dyn GetItemsApi>,
    cache: Arc<dyn SummaryCache>,
    options: ServiceOptions,
}

impl ItemService {
    pub fn new(
        credentials: Option<Credentials>,
        api: Box<dyn GetItemsApi>,
        cache: Arc<dyn SummaryCache>,
        options: ServiceOptions,
    ) -> Self {
        let options = ServiceOptions { batch_size: options.batch_size.max(1), ..options };
        Self { credentials, api, cache, options }
    }

    /// Builds a service backed by the PA-API client and the shared cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = PaapiClient::new(config).context("Failed to create PA-API client")?;

        Ok(Self::new(
            Credentials::resolve(config),
            Box::new(client),
            MemoryCache::shared(),
            ServiceOptions::from(config),
        ))
    }

    /// Builds a service from [`Config::from_process_env`]. Credentials, client
    /// and options all come from that one process-wide configuration.
    pub fn from_env() -> Result<Self> {
        let config = Config::from_process_env();
        let client = PaapiClient::new(config).context("Failed to create PA-API client")?;

        Ok(Self::new(
            Credentials::from_process_env().cloned(),
            Box::new(client),
            MemoryCache::shared(),
            ServiceOptions::from(config),
        ))
    }

    pub fn options(&self) -> ServiceOptions {
        self.options
    }

    /// Returns false when credentials are missing and every lookup is a no-op.
    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Looks up summaries for `ids`. Unresolvable ids are absent from the result.
    pub async fn get_summaries<S: AsRef<str>>(&self, ids: &[S]) -> HashMap<String, ItemSummary> {
        let credentials = match &self.credentials {
            Some(credentials) => credentials,
            None => {
                debug!("PA-API not configured; skipping {} ids", ids.len());
                return HashMap::new();
            }
        };

        let mut result = HashMap::new();
        let mut pending = Vec::new();

        for id in canonicalize_ids(ids) {
            match self.cache.get(&id) {
                Lookup::Hit(summary) => {
                    result.insert(id, summary);
                }
                Lookup::Absent => debug!("Cached as absent: {}", id),
                Lookup::Miss => pending.push(id),
            }
        }

        if pending.is_empty() {
            return result;
        }

        debug!("{} cache hits, {} pending", result.len(), pending.len());

        let chunks: Vec<&[String]> = pending.chunks(self.options.batch_size).collect();
        let total = chunks.len();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let rate_limited = match self.api.get_items(credentials, chunk).await {
                Ok(outcome) => {
                    let mut found: HashMap<String, ItemSummary> = outcome
                        .items
                        .into_iter()
                        .map(|item| (item.asin.clone(), item))
                        .collect();

                    for id in chunk {
                        match found.remove(id) {
                            Some(summary) => {
                                let ttl = self.options.positive_ttl;
                                self.cache.set(id, Cached::Found(summary.clone()), ttl);
                                result.insert(id.clone(), summary);
                            }
                            None => self.cache.set(id, Cached::Absent, self.options.negative_ttl),
                        }
                    }

                    if outcome.throttled {
                        warn!("Chunk {}/{} partially throttled", index + 1, total);
                    }
                    outcome.throttled
                }
                Err(e) if e.is_rate_limited() => {
                    warn!("Chunk {}/{} rate limited: {}", index + 1, total, e);
                    self.mark_absent(chunk);
                    true
                }
                Err(e) => {
                    warn!("Chunk {}/{} failed: {}", index + 1, total, e);
                    self.mark_absent(chunk);
                    false
                }
            };

            if rate_limited && index + 1 < total {
                debug!("Backing off {:?}", self.options.rate_limit_backoff);
                tokio::time::sleep(self.options.rate_limit_backoff).await;
            }
        }

        info!("Resolved {} of {} requested ids", result.len(), ids.len());
        result
    }

    fn mark_absent(&self, chunk: &[String]) {
        for id in chunk {
            self.cache.set(id, Cached::Absent, self.options.negative_ttl);
        }
    }
}

/// Trims and uppercases ids, drops invalid ones, and dedupes keeping first-seen order.
pub fn canonicalize_ids<S: AsRef<str>>(ids: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for raw in ids {
        let id = raw.as_ref().trim().to_uppercase();
        if !is_valid_asin(&id) {
            if !id.is_empty() {
                debug!("Skipping invalid ASIN: {}", id);
            }
            continue;
        }
        if seen.insert(id.clone()) {
            out.push(id);
        }
    }

    out
}
