//! Fetch strategies.
//!
//! Each strategy is a function of the request, the network and the cache
//! handle it was granted, with its own freshness/consistency trade-off:
//!
//! - [`stale_while_revalidate`]: cached copy now, refresh in the background (runtime partition)
//! - [`network_first`]: network first, cached shell as outage fallback (static partition)
//! - [`cache_then_network`]: reuse anything cached, else go to the network (no writes)
//!
//! Strategies never create or delete partitions.

mod cache_then_network;
mod network_first;
mod stale_while_revalidate;

pub use cache_then_network::cache_then_network;
pub use network_first::network_first;
pub use stale_while_revalidate::stale_while_revalidate;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use swcache_core::ResponseSnapshot;
use tokio::task::JoinHandle;

use crate::classify::{Freshness, FreshnessPolicy};

/// Where the response handed to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    /// Exact entry for the request.
    Cache,
    /// A different entry standing in for the request (navigation shell).
    Fallback,
}

/// Result of running a strategy.
#[derive(Debug)]
pub struct StrategyOutcome {
    pub response: ResponseSnapshot,
    pub source: ResponseSource,
    /// Detached background refresh, if one was started.
    ///
    /// The caller is never required to await it; dropping the handle does
    /// not cancel the task.
    pub revalidation: Option<JoinHandle<()>>,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Fallback => "fallback",
        }
    }
}

impl StrategyOutcome {
    pub fn network(response: ResponseSnapshot) -> Self {
        Self { response, source: ResponseSource::Network, revalidation: None }
    }

    pub fn cache(response: ResponseSnapshot) -> Self {
        Self { response, source: ResponseSource::Cache, revalidation: None }
    }

    pub fn fallback(response: ResponseSnapshot) -> Self {
        Self { response, source: ResponseSource::Fallback, revalidation: None }
    }
}

/// Rewrite the freshness headers of a response to match its classification.
///
/// The origin's own `Cache-Control`/`Expires` are replaced, not merged.
pub fn freshen(
    mut response: ResponseSnapshot, freshness: Freshness, policy: &FreshnessPolicy, now: DateTime<Utc>,
) -> ResponseSnapshot {
    let expires = i64::try_from(policy.max_age(freshness))
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    response.set_header("Cache-Control", policy.cache_control(freshness));
    response.set_header("Expires", http_date(expires));
    response
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_http_date_format() {
        let t = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_freshen_replaces_origin_headers() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let origin = ResponseSnapshot::new("https://example.com/app.js", 200, "x")
            .with_header("cache-control", "no-cache")
            .with_header("Expires", "0")
            .with_header("Content-Type", "text/javascript");

        let fresh = freshen(origin, Freshness::Mutable, &FreshnessPolicy::default(), now);

        assert_eq!(fresh.header("Cache-Control"), Some("public, max-age=86400"));
        assert_eq!(fresh.header("Expires"), Some("Fri, 02 Jan 2026 00:00:00 GMT"));
        assert_eq!(fresh.header("content-type"), Some("text/javascript"));
        assert_eq!(fresh.headers.len(), 3);
    }

    #[test]
    fn test_freshen_hashed() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let fresh = freshen(
            ResponseSnapshot::new("https://example.com/app.3f9a21b7.js", 200, "x"),
            Freshness::Hashed,
            &FreshnessPolicy::default(),
            now,
        );
        assert_eq!(fresh.header("Cache-Control"), Some("public, max-age=31536000, immutable"));
        assert_eq!(fresh.header("Expires"), Some("Fri, 01 Jan 2027 00:00:00 GMT"));
    }
}
