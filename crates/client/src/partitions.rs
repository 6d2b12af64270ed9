//! Versioned partition lifecycle.
//!
//! The manager is the only component that creates or deletes partitions.
//! Install opens and seeds the static partition for its version; activate
//! sweeps every partition belonging to other versions and opens the runtime
//! partition. Strategies only receive handles.

use std::sync::Arc;

use futures_util::future::join_all;
use reqwest::Url;
use swcache_core::{AppConfig, CacheReader, Error, Partition, PartitionKind, PartitionStore, RequestKey};

use crate::fetch::{FetchRequest, Network, resolve};

/// Result of seeding the static partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Seed URLs stored.
    pub stored: Vec<String>,
    /// Seed URLs skipped, with the reason.
    pub skipped: Vec<(String, String)>,
}

/// Result of the activation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    /// Stale partitions that could not be deleted, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Owns the partitions of one version.
pub struct PartitionManager {
    version: String,
    store: Arc<dyn PartitionStore>,
    network: Arc<dyn Network>,
    scope: Url,
    seeds: Vec<String>,
    fallback: Option<RequestKey>,
    static_name: String,
    runtime_name: String,
}

impl PartitionManager {
    /// Build a manager for `config.version`.
    ///
    /// Seed paths and the fallback document are resolved against the scope.
    /// An unresolvable fallback is ignored with a warning; seeds are resolved
    /// lazily at install so a bad entry only skips itself.
    pub fn new(config: &AppConfig, store: Arc<dyn PartitionStore>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let scope = config
            .scope_url()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let fallback = match resolve(&scope, &config.fallback_document) {
            Ok(url) => Some(RequestKey::get(&url)),
            Err(e) => {
                tracing::warn!(document = %config.fallback_document, "fallback document ignored: {e}");
                None
            }
        };

        Ok(Self {
            version: config.version.clone(),
            store,
            network,
            scope,
            seeds: config.seed_assets.clone(),
            fallback,
            static_name: config.partition_name(PartitionKind::Static),
            runtime_name: config.partition_name(PartitionKind::Runtime),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn static_name(&self) -> &str {
        &self.static_name
    }

    pub fn runtime_name(&self) -> &str {
        &self.runtime_name
    }

    /// Names owned by this version.
    pub fn owned_names(&self) -> [&str; 2] {
        [&self.static_name, &self.runtime_name]
    }

    pub fn static_partition(&self) -> Partition {
        Partition::new(self.static_name.clone(), self.store.clone())
    }

    pub fn runtime_partition(&self) -> Partition {
        Partition::new(self.runtime_name.clone(), self.store.clone())
    }

    pub fn reader(&self) -> CacheReader {
        CacheReader::new(self.store.clone())
    }

    pub fn network(&self) -> Arc<dyn Network> {
        self.network.clone()
    }

    /// Key of the navigation fallback document, if one is configured.
    pub fn fallback_key(&self) -> Option<&RequestKey> {
        self.fallback.as_ref()
    }

    /// Open the static partition and seed it.
    ///
    /// Seeds are fetched concurrently, bypassing HTTP caches. Only 2xx
    /// responses are stored; anything else is logged and skipped, and a
    /// failed seed never fails the install. Re-running install overwrites
    /// the same keys. Fails only if the partition cannot be opened.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.store.open_partition(&self.static_name).await?;
        let partition = self.static_partition();

        let fetches = self.seeds.iter().map(|seed| {
            let partition = &partition;
            async move {
                let outcome = self.seed(partition, seed).await;
                (seed.clone(), outcome)
            }
        });

        let mut report = InstallReport::default();
        for (seed, outcome) in join_all(fetches).await {
            match outcome {
                Ok(()) => report.stored.push(seed),
                Err(reason) => {
                    tracing::warn!(version = %self.version, seed = %seed, "seed skipped: {reason}");
                    report.skipped.push((seed, reason));
                }
            }
        }

        tracing::info!(
            version = %self.version,
            partition = %self.static_name,
            stored = report.stored.len(),
            skipped = report.skipped.len(),
            "static partition seeded"
        );
        Ok(report)
    }

    async fn seed(&self, partition: &Partition, seed: &str) -> Result<(), String> {
        let url = resolve(&self.scope, seed).map_err(|e| e.to_string())?;
        let request = FetchRequest::get(url.clone()).reload();

        let response = self
            .network
            .fetch(&request)
            .await
            .map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("status {}", response.status));
        }

        partition
            .put(RequestKey::get(&url), response)
            .await
            .map_err(|e| e.to_string())
    }

    /// Delete every partition not owned by this version, then open the runtime partition.
    ///
    /// Deletions run concurrently. A failed deletion is reported and the
    /// sweep carries on; it is retried by the next activation.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let owned = self.owned_names();
        let stale: Vec<String> = self
            .store
            .partition_names()
            .await?
            .into_iter()
            .filter(|name| !owned.contains(&name.as_str()))
            .collect();

        let deletions = stale.into_iter().map(|name| async move {
            let result = self.store.delete_partition(&name).await;
            (name, result)
        });

        let mut report = ActivateReport::default();
        for (name, result) in join_all(deletions).await {
            match result {
                Ok(_) => {
                    tracing::debug!(partition = %name, "deleted stale partition");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(partition = %name, "failed to delete stale partition: {e}");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        self.store.open_partition(&self.runtime_name).await?;

        tracing::info!(
            version = %self.version,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "stale partitions swept"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockNetwork;
    use async_trait::async_trait;
    use swcache_core::{CacheEntry, MemoryStore, ResponseSnapshot};

    /// Memory store whose deletion of one partition always fails.
    struct StuckPartition {
        inner: MemoryStore,
        stuck: &'static str,
    }

    #[async_trait]
    impl PartitionStore for StuckPartition {
        async fn open_partition(&self, name: &str) -> Result<(), Error> {
            self.inner.open_partition(name).await
        }

        async fn partition_names(&self) -> Result<Vec<String>, Error> {
            self.inner.partition_names().await
        }

        async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
            if name == self.stuck {
                return Err(Error::CorruptEntry(format!("{name} is locked")));
            }
            self.inner.delete_partition(name).await
        }

        async fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CacheEntry>, Error> {
            self.inner.get(partition, key).await
        }

        async fn put(&self, partition: &str, entry: CacheEntry) -> Result<(), Error> {
            self.inner.put(partition, entry).await
        }

        async fn keys(&self, partition: &str) -> Result<Vec<RequestKey>, Error> {
            self.inner.keys(partition).await
        }
    }

    const SCOPE: &str = "https://portfolio.example/";

    fn config(version: &str) -> AppConfig {
        AppConfig { version: version.into(), scope: SCOPE.into(), ..Default::default() }
    }

    fn seeded_network() -> Arc<MockNetwork> {
        let network = Arc::new(MockNetwork::new());
        network
            .respond("https://portfolio.example/", 200, "<html>root</html>")
            .respond("https://portfolio.example/index.html", 200, "<html>shell</html>")
            .respond("https://portfolio.example/manifest.json", 200, "{}");
        network
    }

    #[tokio::test]
    async fn test_install_seeds_static_partition() {
        let store = Arc::new(MemoryStore::new());
        let network = seeded_network();
        let manager = PartitionManager::new(&config("v1"), store.clone(), network.clone()).unwrap();

        let report = manager.install().await.unwrap();

        assert_eq!(report.stored.len(), 3);
        assert!(report.skipped.is_empty());
        assert_eq!(manager.static_partition().keys().await.unwrap().len(), 3);
        assert!(network.calls().iter().all(|r| r.bypass_cache));
    }

    #[tokio::test]
    async fn test_install_twice_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let manager = PartitionManager::new(&config("v1"), store.clone(), seeded_network()).unwrap();

        manager.install().await.unwrap();
        manager.install().await.unwrap();

        assert_eq!(store.partition_names().await.unwrap(), vec!["static-v1"]);
        assert_eq!(manager.static_partition().keys().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_install_skips_failed_seeds() {
        let store = Arc::new(MemoryStore::new());
        let network = Arc::new(MockNetwork::new());
        network
            .respond("https://portfolio.example/", 200, "root")
            .respond("https://portfolio.example/index.html", 500, "boom")
            .fail("https://portfolio.example/manifest.json");
        let manager = PartitionManager::new(&config("v1"), store.clone(), network).unwrap();

        let report = manager.install().await.unwrap();

        assert_eq!(report.stored, vec!["./"]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(manager.static_partition().keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_activate_sweeps_other_versions() {
        let store = Arc::new(MemoryStore::new());
        let old = PartitionManager::new(&config("v1"), store.clone(), seeded_network()).unwrap();
        old.install().await.unwrap();
        old.activate().await.unwrap();

        let new = PartitionManager::new(&config("v2"), store.clone(), seeded_network()).unwrap();
        new.install().await.unwrap();

        // both versions coexist until the new one activates
        assert_eq!(store.partition_names().await.unwrap(), vec!["runtime-v1", "static-v1", "static-v2"]);

        let report = new.activate().await.unwrap();

        let mut deleted = report.deleted.clone();
        deleted.sort();
        assert_eq!(deleted, vec!["runtime-v1", "static-v1"]);
        assert_eq!(store.partition_names().await.unwrap(), vec!["runtime-v2", "static-v2"]);
    }

    #[tokio::test]
    async fn test_activate_continues_past_failed_deletion() {
        let store = Arc::new(StuckPartition { inner: MemoryStore::new(), stuck: "runtime-v1" });
        for name in ["static-v0", "static-v1", "runtime-v1"] {
            store.open_partition(name).await.unwrap();
        }
        let manager = PartitionManager::new(&config("v2"), store.clone(), seeded_network()).unwrap();

        let report = manager.activate().await.unwrap();

        let mut deleted = report.deleted.clone();
        deleted.sort();
        assert_eq!(deleted, vec!["static-v0", "static-v1"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "runtime-v1");
        assert!(report.failed[0].1.contains("locked"));
        assert_eq!(store.partition_names().await.unwrap(), vec!["runtime-v1", "runtime-v2"]);
    }

    #[tokio::test]
    async fn test_versions_are_isolated() {
        let store = Arc::new(MemoryStore::new());
        let v1 = PartitionManager::new(&config("v1"), store.clone(), seeded_network()).unwrap();
        let v2 = PartitionManager::new(&config("v2"), store.clone(), seeded_network()).unwrap();
        v1.activate().await.unwrap();

        let key = RequestKey::parse("GET", "https://portfolio.example/app.js").unwrap();
        v1.runtime_partition()
            .put(key.clone(), ResponseSnapshot::new("https://portfolio.example/app.js", 200, "v1 bytes"))
            .await
            .unwrap();

        v2.activate().await.unwrap();

        assert!(v2.runtime_partition().match_request(&key).await.unwrap().is_none());
        assert!(matches!(v1.runtime_partition().match_request(&key).await, Err(Error::PartitionMissing(_))));
    }

    #[tokio::test]
    async fn test_namespaced_names() {
        let store = Arc::new(MemoryStore::new());
        let cfg = AppConfig { partition_namespace: Some("portfolio".into()), ..config("v2.0.0") };
        let manager = PartitionManager::new(&cfg, store, seeded_network()).unwrap();
        assert_eq!(manager.owned_names(), ["portfolio-static-v2.0.0", "portfolio-runtime-v2.0.0"]);
        assert_eq!(manager.fallback_key().unwrap().url, "https://portfolio.example/index.html");
    }
}
