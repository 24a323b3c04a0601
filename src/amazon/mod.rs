//! Product Advertising API plumbing: request signing, the GetItems client,
//! response parsing and link resolution.

pub mod client;
pub mod error;
pub mod links;
pub mod marketplace;
pub mod models;
pub mod parser;
pub mod signer;

pub use client::{GetItemsApi, PaapiClient};
pub use error::ApiError;
pub use links::{extract_id, LinkResolver};
pub use marketplace::Marketplace;
pub use models::{ItemSummary, Price, Resolution};
