//! Versioned response cache partitions.
//!
//! This module provides named partitions of stored HTTP responses behind the
//! [`PartitionStore`] trait, with two backends:
//!
//! - SQLite via tokio-rusqlite, with automatic schema migrations and WAL mode
//! - An in-memory map for ephemeral runs and tests
//!
//! Entries are keyed by request identity (method + canonical URL) hashed with SHA-256.

pub mod connection;
pub mod entries;
pub mod entry;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod partition;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entry::{CacheEntry, RequestKey, ResponseSnapshot};
pub use memory::MemoryStore;
pub use partition::{CacheReader, Partition, PartitionKind};
pub use store::PartitionStore;
