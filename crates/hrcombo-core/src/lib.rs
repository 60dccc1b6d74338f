// Shared infrastructure: configuration, group sizes, and flat-file storage.

pub mod config;
pub mod group;
pub mod store;

pub use config::{Config, ConfigError, GroupPolicy};
pub use group::GroupSize;
pub use store::StoreError;
