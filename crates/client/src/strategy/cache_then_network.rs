use swcache_core::{CacheReader, Error, RequestKey};

use super::StrategyOutcome;
use crate::fetch::{FetchRequest, Network};

/// Reuse an entry from any partition, else fetch. Never writes.
pub async fn cache_then_network(
    network: &dyn Network, reader: &CacheReader, request: &FetchRequest,
) -> Result<StrategyOutcome, Error> {
    let key = RequestKey::new(request.method.as_str(), &request.url);

    match reader.match_request(&key).await {
        Ok(Some(cached)) => return Ok(StrategyOutcome::cache(cached)),
        Ok(None) => {}
        Err(e) => tracing::warn!(url = %request.url, "cache lookup failed: {e}"),
    }

    Ok(StrategyOutcome::network(network.fetch(request).await?))
}
