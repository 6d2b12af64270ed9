//! Partition identity and handles.
//!
//! A partition name is derived from a fixed kind plus the build version, so a
//! new deployment yields new names and the previous ones become orphans that
//! activation sweeps away.

use std::fmt;
use std::sync::Arc;

use super::entry::{CacheEntry, RequestKey, ResponseSnapshot};
use super::store::PartitionStore;
use crate::Error;

/// The two partition roles that exist for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// Pre-seeded shell assets and navigation fallbacks.
    Static,
    /// Assets discovered while serving requests.
    Runtime,
}

impl PartitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Runtime => "runtime",
        }
    }

    /// `{kind}-{version}`, or `{namespace}-{kind}-{version}` when namespaced.
    ///
    /// The version is embedded verbatim; it is never parsed.
    pub fn partition_name(&self, namespace: Option<&str>, version: &str) -> String {
        match namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}-{}-{version}", self.as_str()),
            _ => format!("{}-{version}", self.as_str()),
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read/write handle to one partition.
///
/// Handles are handed out by the partition manager. They cannot create or
/// delete partitions; if the partition disappears underneath a handle, its
/// operations fail with [`Error::PartitionMissing`].
#[derive(Clone)]
pub struct Partition {
    name: String,
    store: Arc<dyn PartitionStore>,
}

impl Partition {
    pub fn new(name: impl Into<String>, store: Arc<dyn PartitionStore>) -> Self {
        Self { name: name.into(), store }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn match_request(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        Ok(self.store.get(&self.name, key).await?.map(|e| e.response))
    }

    pub async fn entry(&self, key: &RequestKey) -> Result<Option<CacheEntry>, Error> {
        self.store.get(&self.name, key).await
    }

    pub async fn put(&self, key: RequestKey, response: ResponseSnapshot) -> Result<(), Error> {
        self.store.put(&self.name, CacheEntry::new(key, response)).await
    }

    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.store.keys(&self.name).await
    }
}

/// Read-only view across every partition in the store.
///
/// Backs the default strategy, which may reuse whatever is cached anywhere
/// but never writes.
#[derive(Clone)]
pub struct CacheReader {
    store: Arc<dyn PartitionStore>,
}

impl CacheReader {
    pub fn new(store: Arc<dyn PartitionStore>) -> Self {
        Self { store }
    }

    pub async fn match_request(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        Ok(self.store.match_any(key).await?.map(|e| e.response))
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition").field("name", &self.name).finish()
    }
}
