//! Batch item lookup command.

use crate::amazon::ItemSummary;
use crate::config::{Config, Credentials};
use crate::format::Formatter;
use crate::service::{canonicalize_ids, ItemService};
use anyhow::Result;
use tracing::info;

/// Looks up item summaries by ASIN through the cached batch service.
pub struct ItemsCommand {
    config: Config,
}

impl ItemsCommand {
    /// Creates a new items command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches summaries for `asins` and returns formatted output.
    pub async fn execute(&self, asins: &[String]) -> Result<String> {
        if Credentials::resolve(&self.config).is_none() {
            anyhow::bail!(
                "PA-API credentials are not configured. Set PAAPI_ACCESS_KEY, PAAPI_SECRET_KEY and PAAPI_PARTNER_TAG."
            );
        }

        let service = ItemService::from_config(&self.config)?;
        self.execute_with_service(&service, asins).await
    }

    /// Fetches summaries with a provided service (for testing).
    pub async fn execute_with_service(
        &self,
        service: &ItemService,
        asins: &[String],
    ) -> Result<String> {
        let requested = canonicalize_ids(asins);
        if requested.len() < asins.len() {
            info!("{} duplicate or invalid ASINs ignored", asins.len() - requested.len());
        }

        let mut found = service.get_summaries(&requested).await;

        // Keep the caller's order
        let mut items: Vec<ItemSummary> =
            requested.iter().filter_map(|id| found.remove(id)).collect();

        if let Some(credentials) = Credentials::resolve(&self.config) {
            for item in items.iter_mut().filter(|i| i.detail_page_url.is_none()) {
                let link = item.link(credentials.marketplace, &credentials.partner_tag);
                item.detail_page_url = Some(link);
            }
        }

        for id in requested.iter().filter(|id| !items.iter().any(|i| &i.asin == *id)) {
            eprintln!("No data for {}", id);
        }

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_summaries(&items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::client::GetItemsApi;
    use crate::amazon::error::ApiError;
    use crate::amazon::marketplace::Marketplace;
    use crate::amazon::parser::GetItemsOutcome;
    use crate::cache::MemoryCache;
    use crate::config::OutputFormat;
    use crate::service::ServiceOptions;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Mock client that knows every ASIN except those starting with "X".
    struct MockApi;

    #[async_trait]
    impl GetItemsApi for MockApi {
        async fn get_items(
            &self,
            _credentials: &Credentials,
            item_ids: &[String],
        ) -> Result<GetItemsOutcome, ApiError> {
            let items = item_ids
                .iter()
                .filter(|id| !id.starts_with('X'))
                .map(|id| ItemSummary {
                    title: Some(format!("Title {}", id)),
                    ..ItemSummary::new(id.clone())
                })
                .collect();
            Ok(GetItemsOutcome { items, ..GetItemsOutcome::default() })
        }
    }

    fn make_service() -> ItemService {
        let credentials = Credentials {
            access_key: "AKIDEXAMPLE".to_string(),
            secret_key: "secret".to_string(),
            partner_tag: "blog-20".to_string(),
            marketplace: Marketplace::Us,
            host: "webservices.amazon.com".to_string(),
            region: "us-east-1".to_string(),
            user_agent: None,
        };
        ItemService::new(
            Some(credentials),
            Box::new(MockApi),
            Arc::new(MemoryCache::new()),
            ServiceOptions::default(),
        )
    }

    fn asins(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_items_keep_requested_order() {
        let config = Config { format: OutputFormat::Csv, ..Config::default() };
        let cmd = ItemsCommand::new(config);

        let output = cmd
            .execute_with_service(
                &make_service(),
                &asins(&["B000000002", "b000000001", "XB00000003"]),
            )
            .await
            .unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("B000000002,Title B000000002"));
        assert!(lines[2].starts_with("B000000001,Title B000000001"));
    }

    #[tokio::test]
    async fn test_items_json_format() {
        let config = Config { format: OutputFormat::Json, ..Config::default() };
        let cmd = ItemsCommand::new(config);

        let output =
            cmd.execute_with_service(&make_service(), &asins(&["B08N5WRWNW"])).await.unwrap();
        assert!(output.starts_with('['));
        assert!(output.contains("\"asin\": \"B08N5WRWNW\""));
    }

    #[tokio::test]
    async fn test_items_fill_missing_links() {
        let config = Config {
            format: OutputFormat::Json,
            marketplace: Marketplace::Uk,
            access_key: Some("AKIDEXAMPLE".to_string()),
            secret_key: Some("secret".to_string()),
            partner_tag: Some("blog-21".to_string()),
            ..Config::default()
        };
        let cmd = ItemsCommand::new(config);

        let output =
            cmd.execute_with_service(&make_service(), &asins(&["B08N5WRWNW"])).await.unwrap();
        assert!(output.contains("https://www.amazon.co.uk/dp/B08N5WRWNW?tag=blog-21"));
    }

    #[tokio::test]
    async fn test_items_without_credentials_fails() {
        let cmd = ItemsCommand::new(Config::default());
        let err = cmd.execute(&asins(&["B08N5WRWNW"])).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
