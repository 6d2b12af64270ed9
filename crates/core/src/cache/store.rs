//! Storage abstraction behind the named partitions.

use async_trait::async_trait;

use super::entry::{CacheEntry, RequestKey};
use crate::Error;

/// A directory of named partitions, each an independent key -> response map.
///
/// Writes are atomic per key and last-write-wins. Reads and writes against a
/// partition that was never opened, or has since been deleted, fail with
/// [`Error::PartitionMissing`]; a write never re-creates a deleted partition.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Create the partition if absent. Opening an existing partition is a no-op.
    async fn open_partition(&self, name: &str) -> Result<(), Error>;

    /// Names of all existing partitions, sorted.
    async fn partition_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a partition and everything in it. Returns whether it existed.
    async fn delete_partition(&self, name: &str) -> Result<bool, Error>;

    async fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CacheEntry>, Error>;

    /// Insert or replace the entry stored under `entry.key`.
    async fn put(&self, partition: &str, entry: CacheEntry) -> Result<(), Error>;

    /// Keys currently stored in a partition, ordered by URL.
    async fn keys(&self, partition: &str) -> Result<Vec<RequestKey>, Error>;

    /// Look a request up across every partition, in name order.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<CacheEntry>, Error> {
        for name in self.partition_names().await? {
            match self.get(&name, key).await {
                Ok(Some(entry)) => return Ok(Some(entry)),
                Ok(None) | Err(Error::PartitionMissing(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
