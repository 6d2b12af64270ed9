use std::sync::Arc;

use chrono::Utc;
use swcache_core::{Error, Partition, RequestKey, ResponseSnapshot};

use super::{StrategyOutcome, freshen};
use crate::classify::{Freshness, FreshnessPolicy};
use crate::fetch::{FetchRequest, Network};

/// Serve the cached copy immediately and refresh it in the background.
///
/// On a hit, a detached task refetches the request and, on a 2xx, overwrites
/// the entry with freshness headers for `freshness`. Its failures are logged
/// and never reach the caller. On a miss, the network response is returned;
/// a 2xx is freshened and stored first. A transport failure on a miss is
/// returned as is, since there is nothing to fall back to.
///
/// Entries are written only after the full body has arrived.
pub async fn stale_while_revalidate(
    network: Arc<dyn Network>, partition: &Partition, request: &FetchRequest, freshness: Freshness,
    policy: FreshnessPolicy,
) -> Result<StrategyOutcome, Error> {
    let key = RequestKey::new(request.method.as_str(), &request.url);

    let cached = match partition.match_request(&key).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(partition = partition.name(), url = %request.url, "cache lookup failed: {e}");
            None
        }
    };

    if let Some(cached) = cached {
        tracing::debug!(partition = partition.name(), url = %request.url, "cache hit, revalidating in background");

        let partition = partition.clone();
        let request = request.clone();
        let handle = tokio::spawn(async move {
            match revalidate(network.as_ref(), &partition, &request, key, freshness, &policy).await {
                Ok(true) => tracing::debug!(url = %request.url, "revalidated"),
                Ok(false) => tracing::debug!(url = %request.url, "revalidation returned non-2xx, kept cached copy"),
                Err(e) => tracing::debug!(url = %request.url, "revalidation failed: {e}"),
            }
        });

        return Ok(StrategyOutcome { revalidation: Some(handle), ..StrategyOutcome::cache(cached) });
    }

    tracing::debug!(partition = partition.name(), url = %request.url, "cache miss");

    let response = network.fetch(request).await?;
    if !response.is_ok() {
        return Ok(StrategyOutcome::network(response));
    }

    let fresh = freshen(response, freshness, &policy, Utc::now());
    if let Err(e) = partition.put(key, fresh.clone()).await {
        tracing::warn!(partition = partition.name(), url = %request.url, "failed to store response: {e}");
    }

    Ok(StrategyOutcome::network(fresh))
}

/// Refetch and overwrite. `Ok(false)` when the origin answered with a non-2xx.
async fn revalidate(
    network: &dyn Network, partition: &Partition, request: &FetchRequest, key: RequestKey, freshness: Freshness,
    policy: &FreshnessPolicy,
) -> Result<bool, Error> {
    let response: ResponseSnapshot = network.fetch(request).await?;
    if !response.is_ok() {
        return Ok(false);
    }
    partition
        .put(key, freshen(response, freshness, policy, Utc::now()))
        .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockNetwork;
    use crate::strategy::ResponseSource;
    use reqwest::Url;
    use std::time::{Duration, Instant};
    use swcache_core::{MemoryStore, PartitionStore};

    const ASSET: &str = "https://portfolio.example/assets/app.3f9a21b7.js";
    const MUTABLE: &str = "https://portfolio.example/app.js";

    async fn runtime_partition() -> (Arc<MemoryStore>, Partition) {
        let store = Arc::new(MemoryStore::new());
        store.open_partition("runtime-v1").await.unwrap();
        let partition = Partition::new("runtime-v1", store.clone());
        (store, partition)
    }

    fn request(url: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_hit_returns_before_slow_network() {
        let (_store, partition) = runtime_partition().await;
        let cached = ResponseSnapshot::new(ASSET, 200, "cached-bytes");
        partition
            .put(RequestKey::parse("GET", ASSET).unwrap(), cached.clone())
            .await
            .unwrap();

        let network = Arc::new(MockNetwork::new());
        network
            .respond(ASSET, 200, "fresh-bytes")
            .delay(ASSET, Duration::from_secs(5));

        let start = Instant::now();
        let outcome =
            stale_while_revalidate(network.clone(), &partition, &request(ASSET), Freshness::Hashed, Default::default())
                .await
                .unwrap();

        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response, cached);
        assert!(outcome.revalidation.is_some());
    }

    #[tokio::test]
    async fn test_revalidation_rewrites_freshness_headers() {
        let (_store, partition) = runtime_partition().await;
        let key = RequestKey::parse("GET", ASSET).unwrap();
        partition
            .put(key.clone(), ResponseSnapshot::new(ASSET, 200, "old"))
            .await
            .unwrap();

        let network = Arc::new(MockNetwork::new());
        network.respond(ASSET, 200, "new");

        let outcome =
            stale_while_revalidate(network.clone(), &partition, &request(ASSET), Freshness::Hashed, Default::default())
                .await
                .unwrap();
        assert_eq!(outcome.response.body, b"old");
        outcome.revalidation.unwrap().await.unwrap();

        let stored = partition.match_request(&key).await.unwrap().unwrap();
        assert_eq!(stored.body, b"new");
        assert_eq!(stored.header("Cache-Control"), Some("public, max-age=31536000, immutable"));
        assert!(stored.header("Expires").is_some());
    }

    #[tokio::test]
    async fn test_revalidation_failure_keeps_entry() {
        let (_store, partition) = runtime_partition().await;
        let key = RequestKey::parse("GET", MUTABLE).unwrap();
        partition
            .put(key.clone(), ResponseSnapshot::new(MUTABLE, 200, "old"))
            .await
            .unwrap();

        let network = Arc::new(MockNetwork::new());
        network.fail(MUTABLE);

        let outcome =
            stale_while_revalidate(network.clone(), &partition, &request(MUTABLE), Freshness::Mutable, Default::default())
                .await
                .unwrap();
        outcome.revalidation.unwrap().await.unwrap();

        let stored = partition.match_request(&key).await.unwrap().unwrap();
        assert_eq!(stored.body, b"old");
    }

    #[tokio::test]
    async fn test_revalidation_non_ok_keeps_entry() {
        let (store, partition) = runtime_partition().await;
        let key = RequestKey::parse("GET", MUTABLE).unwrap();
        partition
            .put(key.clone(), ResponseSnapshot::new(MUTABLE, 200, "old"))
            .await
            .unwrap();

        let network = Arc::new(MockNetwork::new());
        network.respond(MUTABLE, 500, "oops");

        let outcome =
            stale_while_revalidate(network.clone(), &partition, &request(MUTABLE), Freshness::Mutable, Default::default())
                .await
                .unwrap();
        outcome.revalidation.unwrap().await.unwrap();

        assert_eq!(partition.match_request(&key).await.unwrap().unwrap().body, b"old");
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_miss_stores_freshened_copy() {
        let (_store, partition) = runtime_partition().await;
        let network = Arc::new(MockNetwork::new());
        network.respond_with(
            MUTABLE,
            ResponseSnapshot::new(MUTABLE, 200, "body").with_header("Cache-Control", "no-store"),
        );

        let outcome =
            stale_while_revalidate(network.clone(), &partition, &request(MUTABLE), Freshness::Mutable, Default::default())
                .await
                .unwrap();

        assert_eq!(outcome.source, ResponseSource::Network);
        assert!(outcome.revalidation.is_none());
        assert_eq!(outcome.response.header("Cache-Control"), Some("public, max-age=86400"));

        let stored = partition
            .match_request(&RequestKey::parse("GET", MUTABLE).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, outcome.response);
    }

    #[tokio::test]
    async fn test_miss_non_ok_is_returned_unstored() {
        let (store, partition) = runtime_partition().await;
        let network = Arc::new(MockNetwork::new());
        network.respond(MUTABLE, 404, "not found");

        let outcome =
            stale_while_revalidate(network.clone(), &partition, &request(MUTABLE), Freshness::Mutable, Default::default())
                .await
                .unwrap();

        assert_eq!(outcome.response.status, 404);
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_miss_network_failure_surfaces() {
        let (_store, partition) = runtime_partition().await;
        let network = Arc::new(MockNetwork::new());
        network.fail(MUTABLE);

        let result =
            stale_while_revalidate(network.clone(), &partition, &request(MUTABLE), Freshness::Mutable, Default::default())
                .await;

        assert!(matches!(result, Err(Error::Network(_))));
    }
}
