//! amz-enrich - Amazon product enrichment for affiliate links
//!
//! Resolves product and short links to ASINs and fetches item summaries
//! (title, image, price, rating) from the Product Advertising API with a
//! signed, batched and cached client. Without credentials every lookup is a
//! silent no-op.

pub mod amazon;
pub mod cache;
pub mod commands;
pub mod config;
pub mod format;
pub mod service;

pub use amazon::models::{ItemSummary, Price, Resolution};
pub use amazon::{extract_id, LinkResolver, Marketplace};
pub use config::{Config, Credentials};
pub use service::ItemService;
