//! amz-enrich - Amazon product enrichment CLI
//!
//! Looks up item summaries through the Product Advertising API and resolves
//! product links to ASINs.

use amz_enrich::amazon::Marketplace;
use amz_enrich::commands::{ItemsCommand, ResolveCommand};
use amz_enrich::config::{Config, OutputFormat};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-enrich",
    version,
    about = "Amazon product enrichment for affiliate links",
    long_about = "Resolves Amazon product and short links to ASINs and fetches item summaries from the Product Advertising API."
)]
struct Cli {
    /// Amazon marketplace (overrides config and PAAPI_MARKETPLACE)
    #[arg(short, long, global = true)]
    marketplace: Option<Marketplace>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch item summaries by ASIN
    #[command(alias = "i")]
    Items {
        /// ASIN(s) to look up
        #[arg(required = true)]
        asins: Vec<String>,
    },

    /// Resolve product or short links to ASINs, following redirects
    #[command(alias = "r")]
    Resolve {
        /// URL(s) to resolve
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Extract ASINs from product URLs without network access
    Extract {
        /// URL(s) to inspect
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// List supported marketplaces
    Marketplaces,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.format = cli.format;

    if let Some(marketplace) = cli.marketplace {
        config.marketplace = marketplace;
    }

    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Items { asins } => {
            let cmd = ItemsCommand::new(config);
            let output = cmd.execute(&asins).await?;
            println!("{}", output);
        }

        Commands::Resolve { urls } => {
            let cmd = ResolveCommand::new(config);
            let output = cmd.execute(&urls).await?;
            println!("{}", output);
        }

        Commands::Extract { urls } => {
            let cmd = ResolveCommand::new(config);
            println!("{}", cmd.extract(&urls));
        }

        Commands::Marketplaces => {
            println!("Supported Amazon marketplaces:\n");
            println!(
                "{:<6} {:<20} {:<28} {:<10} {:<10}",
                "Code", "Domain", "API host", "Region", "Currency"
            );
            println!("{:-<6} {:-<20} {:-<28} {:-<10} {:-<10}", "", "", "", "", "");

            for marketplace in Marketplace::all() {
                println!(
                    "{:<6} {:<20} {:<28} {:<10} {:<10}",
                    marketplace.to_string(),
                    marketplace.domain(),
                    marketplace.api_host(),
                    marketplace.aws_region(),
                    marketplace.currency()
                );
            }
        }
    }

    Ok(())
}
