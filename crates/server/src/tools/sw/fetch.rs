//! sw_fetch tool implementation.
//!
//! Delivers a fetch event to the registration and reports how it was served.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::InterceptedRequest;
use swcache_client::fetch::Method;

use crate::error::HarnessError;
use crate::harness::Harness;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request, absolute or relative to the scope (e.g. "./app.js").
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Treat the request as a top-level page navigation.
    #[serde(default)]
    pub navigate: bool,
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// URL the response was served for.
    pub response_url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_len: usize,
    /// "network", "cache" or "fallback".
    pub source: String,
    /// Strategy that handled the request; absent when no worker was active.
    pub strategy: Option<String>,
    /// "hashed" or "mutable" for static assets.
    pub freshness: Option<String>,
    /// Version of the worker that served it; absent on passthrough without a worker.
    pub version: Option<String>,
    /// A background revalidation was started.
    pub revalidating: bool,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(harness: &Harness, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(HarnessError::InvalidInput("url cannot be empty".into()).into());
    }

    let method = parse_method(params.method.as_deref())?;
    let url = harness.resolve(&params.url)?;

    let result = harness
        .registration()
        .handle_fetch(InterceptedRequest::new(method, url.clone(), params.navigate))
        .await?;

    let response = result.outcome.response;
    let output = SwFetchOutput {
        url: url.to_string(),
        response_url: response.url.clone(),
        status: response.status,
        status_text: response.status_text.clone(),
        body: response.body_text(),
        body_len: response.body.len(),
        headers: response.headers,
        source: result.outcome.source.as_str().to_string(),
        strategy: result.route.map(|r| r.name().to_string()),
        freshness: result
            .route
            .and_then(|r| r.freshness())
            .map(|f| f.as_str().to_string()),
        version: result.version,
        revalidating: result.outcome.revalidation.is_some(),
    };

    let json = serde_json::to_string_pretty(&output).map_err(HarnessError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_method(method: Option<&str>) -> Result<Method, HarnessError> {
    match method.map(str::trim) {
        None | Some("") => Ok(Method::GET),
        Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
            .map_err(|e| HarnessError::InvalidInput(format!("invalid method {m:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::testing::{harness, output};
    use swcache_core::PartitionStore;

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: None, navigate: false }
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method(None).unwrap(), Method::GET);
        assert_eq!(parse_method(Some("post")).unwrap(), Method::POST);
        assert!(parse_method(Some("GE T")).is_err());
    }

    #[tokio::test]
    async fn test_fetch_before_start_passes_through() {
        let (_store, _network, harness) = harness();

        let result = fetch_impl(&harness, params("./manifest.json")).await.unwrap();
        let out: SwFetchOutput = output(&result);

        assert_eq!(out.source, "network");
        assert_eq!(out.strategy, None);
        assert_eq!(out.version, None);
    }

    #[tokio::test]
    async fn test_fetch_static_asset() {
        let (_store, network, harness) = harness();
        network.respond("https://portfolio.example/assets/app.3f9a21b7.js", 200, "js");
        harness.start().await.unwrap();

        let result = fetch_impl(&harness, params("/assets/app.3f9a21b7.js")).await.unwrap();
        let out: SwFetchOutput = output(&result);

        assert_eq!(out.strategy.as_deref(), Some("stale_while_revalidate"));
        assert_eq!(out.freshness.as_deref(), Some("hashed"));
        assert_eq!(out.source, "network");
        assert_eq!(out.version.as_deref(), Some("v1"));
        assert_eq!(out.body, "js");
    }

    #[tokio::test]
    async fn test_offline_navigation_serves_shell() {
        let (_store, _network, harness) = harness();
        harness.start().await.unwrap();

        let result = fetch_impl(
            &harness,
            SwFetchParams { url: "/some/deep/route".into(), method: None, navigate: true },
        )
        .await
        .unwrap();
        let out: SwFetchOutput = output(&result);

        assert_eq!(out.source, "fallback");
        assert_eq!(out.body, "<html>shell</html>");
    }

    #[tokio::test]
    async fn test_post_is_passthrough() {
        let (store, network, harness) = harness();
        network.respond("https://portfolio.example/api/contact", 202, "queued");
        harness.start().await.unwrap();
        let puts = store.put_count();

        let result = fetch_impl(
            &harness,
            SwFetchParams { url: "/api/contact".into(), method: Some("POST".into()), navigate: false },
        )
        .await
        .unwrap();
        let out: SwFetchOutput = output(&result);

        assert_eq!(out.status, 202);
        assert_eq!(out.strategy.as_deref(), Some("passthrough"));
        assert_eq!(store.put_count(), puts);
        assert!(store.keys("runtime-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let (_store, _network, harness) = harness();
        assert!(fetch_impl(&harness, params("  ")).await.is_err());
    }
}
