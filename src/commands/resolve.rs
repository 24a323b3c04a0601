//! Link resolution commands.

use crate::amazon::links::{self, LinkResolver};
use crate::amazon::Resolution;
use crate::config::Config;
use crate::format::{Formatter, ResolvedLink};
use anyhow::{Context, Result};

/// Resolves product and short links to ASINs.
pub struct ResolveCommand {
    config: Config,
}

impl ResolveCommand {
    /// Creates a new resolve command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Resolves every URL, following short links over the network when needed.
    pub async fn execute(&self, urls: &[String]) -> Result<String> {
        let resolver =
            LinkResolver::from_config(&self.config).context("Failed to create HTTP client")?;
        self.execute_with_resolver(&resolver, urls).await
    }

    /// Resolves URLs with a provided resolver (for testing).
    pub async fn execute_with_resolver(
        &self,
        resolver: &LinkResolver,
        urls: &[String],
    ) -> Result<String> {
        let mut resolved = Vec::with_capacity(urls.len());
        for url in urls {
            let resolution = resolver.resolve(url).await;
            resolved.push(ResolvedLink { input: url.clone(), resolution });
        }

        Ok(Formatter::new(self.config.format).format_resolutions(&resolved))
    }

    /// Extracts ASINs without any network access.
    pub fn extract(&self, urls: &[String]) -> String {
        let resolved: Vec<ResolvedLink> = urls
            .iter()
            .map(|url| ResolvedLink {
                input: url.clone(),
                resolution: Resolution {
                    id: links::extract_id(url),
                    final_url: url.trim().to_string(),
                },
            })
            .collect();

        Formatter::new(self.config.format).format_resolutions(&resolved)
    }
}
