//! Configuration management with TOML, environment variables, and CLI overrides.
//!
//! [`Config`] is the layered, user-facing configuration. [`Credentials`] is the
//! validated subset the Product Advertising API needs; resolving it yields
//! `None` when anything required is missing, which turns the integration into
//! a no-op instead of an error.

use crate::amazon::marketplace::Marketplace;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Application configuration with layered loading.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Marketplace to query
    #[serde(default)]
    pub marketplace: Marketplace,

    /// PA-API access key id
    #[serde(default)]
    pub access_key: Option<String>,

    /// PA-API secret key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Associates partner tag (e.g. "mysite-20")
    #[serde(default)]
    pub partner_tag: Option<String>,

    /// API host override (defaults to the marketplace's host)
    #[serde(default)]
    pub host: Option<String>,

    /// Signing region override (defaults to the marketplace's region)
    #[serde(default)]
    pub aws_region: Option<String>,

    /// User-Agent override for outbound requests
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// TTL for resolved items
    #[serde(default = "default_positive_ttl_secs")]
    pub positive_ttl_secs: u64,

    /// TTL for absent items and failed lookups
    #[serde(default = "default_negative_ttl_secs")]
    pub negative_ttl_secs: u64,

    /// Pause after a rate-limited chunk, in milliseconds
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra hosts treated as affiliate short-link domains
    #[serde(default)]
    pub short_link_hosts: Vec<String>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_positive_ttl_secs() -> u64 {
    30 * 60
}

fn default_negative_ttl_secs() -> u64 {
    5 * 60
}

fn default_rate_limit_backoff_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marketplace: Marketplace::Us,
            access_key: None,
            secret_key: None,
            partner_tag: None,
            host: None,
            aws_region: None,
            user_agent: None,
            proxy: None,
            positive_ttl_secs: default_positive_ttl_secs(),
            negative_ttl_secs: default_negative_ttl_secs(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            short_link_hosts: Vec::new(),
            format: OutputFormat::Table,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("marketplace", &self.marketplace)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("partner_tag", &self.partner_tag)
            .field("host", &self.host)
            .field("aws_region", &self.aws_region)
            .field("user_agent", &self.user_agent)
            .field("proxy", &self.proxy)
            .field("positive_ttl_secs", &self.positive_ttl_secs)
            .field("negative_ttl_secs", &self.negative_ttl_secs)
            .field("rate_limit_backoff_ms", &self.rate_limit_backoff_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("short_link_hosts", &self.short_link_hosts)
            .field("format", &self.format)
            .finish()
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-enrich").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Loads the file layer and applies environment overrides. An unreadable
    /// file falls back to defaults so the integration degrades instead of failing.
    pub fn load_layered(explicit_path: Option<&Path>) -> Self {
        let config = Self::load(explicit_path).unwrap_or_else(|e| {
            warn!("Ignoring unreadable config file: {:#}", e);
            Self::default()
        });
        config.with_env()
    }

    /// Configuration from the default locations and the process environment,
    /// loaded once per process.
    pub fn from_process_env() -> &'static Config {
        static LOADED: OnceLock<Config> = OnceLock::new();
        LOADED.get_or_init(|| Self::load_layered(None))
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(marketplace) = std::env::var("PAAPI_MARKETPLACE") {
            if let Ok(m) = marketplace.parse() {
                self.marketplace = m;
            }
        }

        for (var, slot) in [
            ("PAAPI_ACCESS_KEY", &mut self.access_key),
            ("PAAPI_SECRET_KEY", &mut self.secret_key),
            ("PAAPI_PARTNER_TAG", &mut self.partner_tag),
            ("PAAPI_HOST", &mut self.host),
            ("PAAPI_REGION", &mut self.aws_region),
            ("PAAPI_USER_AGENT", &mut self.user_agent),
        ] {
            if let Ok(value) = std::env::var(var) {
                *slot = Some(value);
            }
        }

        self
    }

    pub fn positive_ttl(&self) -> Duration {
        Duration::from_secs(self.positive_ttl_secs)
    }

    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Validated PA-API credentials. Immutable once resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub partner_tag: String,
    pub marketplace: Marketplace,
    pub host: String,
    pub region: String,
    pub user_agent: Option<String>,
}

impl Credentials {
    /// Resolves credentials from a loaded config.
    ///
    /// Returns `None` if any required value is missing or blank.
    pub fn resolve(config: &Config) -> Option<Self> {
        let access_key = non_blank(config.access_key.as_deref())?;
        let secret_key = non_blank(config.secret_key.as_deref())?;
        let partner_tag = non_blank(config.partner_tag.as_deref())?;
        let host =
            non_blank(config.host.as_deref()).unwrap_or_else(|| config.marketplace.api_host());
        let region = non_blank(config.aws_region.as_deref())
            .unwrap_or_else(|| config.marketplace.aws_region().to_string());

        Some(Self {
            access_key,
            secret_key,
            partner_tag,
            marketplace: config.marketplace,
            host,
            region,
            user_agent: non_blank(config.user_agent.as_deref()),
        })
    }

    /// Resolves credentials from [`Config::from_process_env`], once per process.
    pub fn from_process_env() -> Option<&'static Credentials> {
        static RESOLVED: OnceLock<Option<Credentials>> = OnceLock::new();

        RESOLVED
            .get_or_init(|| {
                let resolved = Self::resolve(Config::from_process_env());
                if resolved.is_none() {
                    debug!("PA-API credentials incomplete; product enrichment disabled");
                }
                resolved
            })
            .as_ref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("partner_tag", &self.partner_tag)
            .field("marketplace", &self.marketplace)
            .field("host", &self.host)
            .field("region", &self.region)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
