use swcache_core::{Error, Partition, RequestKey};

use super::StrategyOutcome;
use crate::fetch::{FetchRequest, Network};

/// Prefer the network; fall back to the static partition when it is unreachable.
///
/// Any response the network produces is returned, whatever its status, and a
/// 2xx is stored under the request key so the next outage can replay it.
/// Only a transport failure triggers the fallback chain: the exact request in
/// `partition`, then the `fallback` document (the app shell), then
/// [`Error::NoResponse`].
pub async fn network_first(
    network: &dyn Network, partition: &Partition, request: &FetchRequest, fallback: Option<&RequestKey>,
) -> Result<StrategyOutcome, Error> {
    let key = RequestKey::new(request.method.as_str(), &request.url);

    let failure = match network.fetch(request).await {
        Ok(response) => {
            if response.is_ok()
                && let Err(e) = partition.put(key, response.clone()).await
            {
                tracing::warn!(partition = partition.name(), url = %request.url, "failed to store navigation: {e}");
            }
            return Ok(StrategyOutcome::network(response));
        }
        Err(e) => e,
    };

    tracing::info!(url = %request.url, "network unavailable, serving from cache: {failure}");

    if let Some(cached) = lookup(partition, &key).await {
        return Ok(StrategyOutcome::cache(cached));
    }

    if let Some(shell) = fallback
        && let Some(cached) = lookup(partition, shell).await
    {
        tracing::debug!(url = %request.url, fallback = %shell.url, "serving fallback document");
        return Ok(StrategyOutcome::fallback(cached));
    }

    Err(Error::NoResponse(format!("{} {}: {failure}", request.method, request.url)))
}

/// A failed lookup during an outage is treated as a miss.
async fn lookup(partition: &Partition, key: &RequestKey) -> Option<swcache_core::ResponseSnapshot> {
    match partition.match_request(key).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(partition = partition.name(), url = %key.url, "cache lookup failed: {e}");
            None
        }
    }
}
