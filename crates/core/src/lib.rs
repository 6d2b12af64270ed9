//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Versioned cache partitions with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    CacheDb, CacheEntry, CacheReader, MemoryStore, Partition, PartitionKind, PartitionStore, RequestKey, ResponseSnapshot,
};
pub use config::AppConfig;
pub use error::Error;
