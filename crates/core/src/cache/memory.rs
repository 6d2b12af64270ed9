//! In-memory partition store.
//!
//! Same contract as the SQLite store, kept in a `BTreeMap` behind a tokio
//! `RwLock`. Used for ephemeral runs and as the injected store in tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::entry::{CacheEntry, RequestKey};
use super::store::PartitionStore;
use crate::Error;

type Entries = BTreeMap<String, CacheEntry>;

/// Partition store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<BTreeMap<String, Entries>>,
    puts: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls observed, successful or not.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PartitionStore for MemoryStore {
    async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        partitions.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn partition_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.partitions.read().await.keys().cloned().collect())
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        Ok(self.partitions.write().await.remove(name).is_some())
    }

    async fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CacheEntry>, Error> {
        let partitions = self.partitions.read().await;
        let entries = partitions
            .get(partition)
            .ok_or_else(|| Error::PartitionMissing(partition.to_string()))?;
        Ok(entries.get(&key.hash()).cloned())
    }

    async fn put(&self, partition: &str, entry: CacheEntry) -> Result<(), Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut partitions = self.partitions.write().await;
        let entries = partitions
            .get_mut(partition)
            .ok_or_else(|| Error::PartitionMissing(partition.to_string()))?;
        entries.insert(entry.key.hash(), entry);
        Ok(())
    }

    async fn keys(&self, partition: &str) -> Result<Vec<RequestKey>, Error> {
        let partitions = self.partitions.read().await;
        let entries = partitions
            .get(partition)
            .ok_or_else(|| Error::PartitionMissing(partition.to_string()))?;
        let mut keys: Vec<RequestKey> = entries.values().map(|e| e.key.clone()).collect();
        keys.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(keys)
    }
}
