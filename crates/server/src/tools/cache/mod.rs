//! Partition inspection tools.
//!
//! Read-only: partitions are only ever created or deleted by worker lifecycle events.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
