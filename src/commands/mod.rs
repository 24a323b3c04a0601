//! CLI command implementations.

pub mod items;
pub mod resolve;

pub use items::ItemsCommand;
pub use resolve::ResolveCommand;
