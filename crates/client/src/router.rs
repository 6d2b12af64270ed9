//! Request routing.
//!
//! Routing is a pure decision over (method, URL, navigation flag) followed by
//! a dispatch to one strategy. The router itself never reads or writes a
//! partition.

use std::sync::Arc;

use reqwest::{Method, Url};
use serde::Serialize;
use swcache_core::Error;

use crate::classify::{Freshness, FreshnessPolicy, classify};
use crate::fetch::{FetchRequest, same_origin};
use crate::partitions::PartitionManager;
use crate::strategy::{self, StrategyOutcome};

/// An intercepted request as the page issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub request: FetchRequest,
    /// Top-level document load.
    pub navigate: bool,
}

impl InterceptedRequest {
    pub fn new(method: Method, url: Url, navigate: bool) -> Self {
        Self { request: FetchRequest::new(method, url), navigate }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, false)
    }

    pub fn navigation(url: Url) -> Self {
        Self::new(Method::GET, url, true)
    }
}

/// Which strategy handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "strategy", content = "freshness")]
pub enum Route {
    /// Non-GET: straight to the network, no cache involvement.
    Passthrough,
    NetworkFirst,
    StaleWhileRevalidate(Freshness),
    CacheThenNetwork,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Passthrough => "passthrough",
            Route::NetworkFirst => "network_first",
            Route::StaleWhileRevalidate(_) => "stale_while_revalidate",
            Route::CacheThenNetwork => "cache_then_network",
        }
    }

    pub fn freshness(&self) -> Option<Freshness> {
        match self {
            Route::StaleWhileRevalidate(freshness) => Some(*freshness),
            _ => None,
        }
    }
}

/// Pick the strategy for a request.
///
/// 1. non-GET: passthrough
/// 2. navigation: network-first against the static partition
/// 3. same-origin static asset: stale-while-revalidate against the runtime partition
/// 4. anything else, cross-origin included: cache-then-network
pub fn route(intercepted: &InterceptedRequest, scope: &Url) -> Route {
    let request = &intercepted.request;
    if request.method != Method::GET {
        return Route::Passthrough;
    }
    if intercepted.navigate {
        return Route::NetworkFirst;
    }
    if same_origin(&request.url, scope)
        && let Some(freshness) = classify(&request.url)
    {
        return Route::StaleWhileRevalidate(freshness);
    }
    Route::CacheThenNetwork
}

/// Dispatches intercepted requests for one worker version.
pub struct Router {
    manager: Arc<PartitionManager>,
    policy: FreshnessPolicy,
}

impl Router {
    pub fn new(manager: Arc<PartitionManager>, policy: FreshnessPolicy) -> Self {
        Self { manager, policy }
    }

    pub fn route(&self, intercepted: &InterceptedRequest) -> Route {
        route(intercepted, self.manager.scope())
    }

    pub async fn handle(&self, intercepted: &InterceptedRequest) -> Result<(Route, StrategyOutcome), Error> {
        let route = self.route(intercepted);
        let request = &intercepted.request;
        let network = self.manager.network();

        tracing::debug!(method = %request.method, url = %request.url, ?route, "routing request");

        let outcome = match route {
            Route::Passthrough => StrategyOutcome::network(network.fetch(request).await?),
            Route::NetworkFirst => {
                strategy::network_first(
                    network.as_ref(),
                    &self.manager.static_partition(),
                    request,
                    self.manager.fallback_key(),
                )
                .await?
            }
            Route::StaleWhileRevalidate(freshness) => {
                strategy::stale_while_revalidate(
                    network,
                    &self.manager.runtime_partition(),
                    request,
                    freshness,
                    self.policy,
                )
                .await?
            }
            Route::CacheThenNetwork => {
                strategy::cache_then_network(network.as_ref(), &self.manager.reader(), request).await?
            }
        };

        Ok((route, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockNetwork;
    use crate::strategy::ResponseSource;
    use swcache_core::{AppConfig, MemoryStore, PartitionStore, RequestKey, ResponseSnapshot};

    const SCOPE: &str = "https://portfolio.example/";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn scope() -> Url {
        url(SCOPE)
    }

    async fn router(network: Arc<MockNetwork>) -> (Arc<MemoryStore>, Arc<PartitionManager>, Router) {
        let store = Arc::new(MemoryStore::new());
        let config = AppConfig { version: "v1".into(), scope: SCOPE.into(), ..Default::default() };
        let manager = Arc::new(PartitionManager::new(&config, store.clone(), network).unwrap());
        manager.install().await.unwrap();
        manager.activate().await.unwrap();
        let router = Router::new(manager.clone(), FreshnessPolicy::default());
        (store, manager, router)
    }

    #[test]
    fn test_route_table() {
        let cases = [
            (InterceptedRequest::navigation(url("https://portfolio.example/about")), Route::NetworkFirst),
            (
                InterceptedRequest::get(url("https://portfolio.example/assets/app.3f9a21b7.js")),
                Route::StaleWhileRevalidate(Freshness::Hashed),
            ),
            (
                InterceptedRequest::get(url("https://portfolio.example/img/hero.png")),
                Route::StaleWhileRevalidate(Freshness::Mutable),
            ),
            (InterceptedRequest::get(url("https://portfolio.example/api/projects")), Route::CacheThenNetwork),
            (InterceptedRequest::get(url("https://fonts.example.net/inter.css")), Route::CacheThenNetwork),
            (InterceptedRequest::get(url("http://portfolio.example/app.js")), Route::CacheThenNetwork),
            (
                InterceptedRequest::new(Method::POST, url("https://portfolio.example/api/contact"), false),
                Route::Passthrough,
            ),
            (
                InterceptedRequest::new(Method::POST, url("https://portfolio.example/app.js"), true),
                Route::Passthrough,
            ),
        ];

        for (request, expected) in cases {
            assert_eq!(route(&request, &scope()), expected, "request: {request:?}");
        }
    }

    #[test]
    fn test_route_serialization() {
        let json = serde_json::to_value(Route::StaleWhileRevalidate(Freshness::Hashed)).unwrap();
        assert_eq!(json, serde_json::json!({"strategy": "stale_while_revalidate", "freshness": "hashed"}));
        let json = serde_json::to_value(Route::Passthrough).unwrap();
        assert_eq!(json, serde_json::json!({"strategy": "passthrough"}));
    }

    #[tokio::test]
    async fn test_post_never_touches_partitions() {
        let network = Arc::new(MockNetwork::new());
        network.respond("https://portfolio.example/api/contact", 201, "created");
        let (store, _manager, router) = router(network.clone()).await;
        let puts_before = store.put_count();

        let intercepted = InterceptedRequest::new(Method::POST, url("https://portfolio.example/api/contact"), false);
        let (route, outcome) = router.handle(&intercepted).await.unwrap();

        assert_eq!(route, Route::Passthrough);
        assert_eq!(outcome.response.status, 201);
        assert_eq!(store.put_count(), puts_before);
        assert_eq!(network.call_count("https://portfolio.example/api/contact"), 1);
        assert_eq!(
            network
                .calls()
                .last()
                .map(|r| r.method.clone()),
            Some(Method::POST)
        );
    }

    #[tokio::test]
    async fn test_post_with_cached_url_still_goes_to_network() {
        let network = Arc::new(MockNetwork::new());
        network.respond(SCOPE, 200, "root");
        let (store, manager, router) = router(network.clone()).await;
        assert!(
            manager
                .static_partition()
                .match_request(&RequestKey::parse("GET", SCOPE).unwrap())
                .await
                .unwrap()
                .is_some()
        );
        let puts_before = store.put_count();

        let intercepted = InterceptedRequest::new(Method::POST, scope(), false);
        let (_, outcome) = router.handle(&intercepted).await.unwrap();

        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(store.put_count(), puts_before);
    }

    #[tokio::test]
    async fn test_offline_deep_navigation_serves_shell() {
        let network = Arc::new(MockNetwork::new());
        network.respond("https://portfolio.example/index.html", 200, "<html>shell</html>");
        let (_store, _manager, router) = router(network.clone()).await;

        let intercepted = InterceptedRequest::navigation(url("https://portfolio.example/some/deep/route"));
        let (route, outcome) = router.handle(&intercepted).await.unwrap();

        assert_eq!(route, Route::NetworkFirst);
        assert_eq!(outcome.source, ResponseSource::Fallback);
        assert_eq!(outcome.response.body, b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_static_asset_lands_in_runtime_partition() {
        let asset = "https://portfolio.example/assets/app.3f9a21b7.js";
        let network = Arc::new(MockNetwork::new());
        network.respond(asset, 200, "console.log(1)");
        let (store, manager, router) = router(network.clone()).await;

        router
            .handle(&InterceptedRequest::get(url(asset)))
            .await
            .unwrap();

        let key = RequestKey::parse("GET", asset).unwrap();
        let stored = manager
            .runtime_partition()
            .match_request(&key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.header("cache-control"), Some("public, max-age=31536000, immutable"));
        assert!(store.get("static-v1", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_request_reuses_seeded_entry() {
        let manifest = "https://portfolio.example/manifest.json";
        let network = Arc::new(MockNetwork::new());
        network.respond_with(manifest, ResponseSnapshot::new(manifest, 200, "{\"v\":1}"));
        let (_store, _manager, router) = router(network.clone()).await;

        let (route, outcome) = router
            .handle(&InterceptedRequest::get(url(manifest)))
            .await
            .unwrap();

        assert_eq!(route, Route::CacheThenNetwork);
        assert_eq!(outcome.source, ResponseSource::Cache);
        // only the install fetch
        assert_eq!(network.call_count(manifest), 1);
    }
}
