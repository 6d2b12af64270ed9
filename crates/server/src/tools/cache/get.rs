//! cache_get tool implementation.
//!
//! Reads one stored entry from a named partition.

use chrono::Utc;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheEntry, Error, RequestKey};

use crate::error::HarnessError;
use crate::harness::Harness;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Partition name, e.g. "static-v2.0.0".
    pub partition: String,

    /// Request URL, absolute or relative to the scope.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub partition: String,
    pub entry: CacheEntry,
    /// Body decoded as UTF-8 (lossy).
    pub body_text: String,
    /// Seconds since the entry was written.
    pub age_secs: Option<i64>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(harness: &Harness, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    if params.partition.trim().is_empty() {
        return Err(HarnessError::InvalidInput("partition cannot be empty".into()).into());
    }

    let key = RequestKey::get(&harness.resolve(&params.url)?);
    let entry = harness
        .store()
        .get(&params.partition, &key)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} in {}", key.url, params.partition)))?;

    let age_secs = entry
        .stored_at()
        .map(|stored| (Utc::now() - stored).num_seconds());
    let output =
        CacheGetOutput { partition: params.partition, body_text: entry.response.body_text(), age_secs, entry };

    let json = serde_json::to_string_pretty(&output).map_err(HarnessError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::testing::{harness, output};

    #[tokio::test]
    async fn test_get_seeded_entry() {
        let (_store, _network, harness) = harness();
        harness.start().await.unwrap();

        let params = CacheGetParams { partition: "static-v1".into(), url: "./index.html".into() };
        let out: CacheGetOutput = output(&get_impl(&harness, params).await.unwrap());

        assert_eq!(out.body_text, "<html>shell</html>");
        assert_eq!(out.entry.key.url, "https://portfolio.example/index.html");
        assert!(out.age_secs.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_entry() {
        let (_store, _network, harness) = harness();
        harness.start().await.unwrap();

        let params = CacheGetParams { partition: "static-v1".into(), url: "/nope.html".into() };
        let err = get_impl(&harness, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_missing_partition() {
        let (_store, _network, harness) = harness();

        let params = CacheGetParams { partition: "static-v0".into(), url: "./".into() };
        let err = get_impl(&harness, params).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}
