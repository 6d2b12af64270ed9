//! cache_keys tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::harness::Harness;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    pub partition: String,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub partition: String,
    /// Stored request URLs, sorted.
    pub urls: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(harness: &Harness, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let keys = harness.store().keys(&params.partition).await?;
    let output = CacheKeysOutput { partition: params.partition, urls: keys.into_iter().map(|k| k.url).collect() };

    let json = serde_json::to_string_pretty(&output).map_err(HarnessError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::testing::{harness, output};

    #[tokio::test]
    async fn test_keys_lists_seeds() {
        let (_store, _network, harness) = harness();
        harness.start().await.unwrap();

        let params = CacheKeysParams { partition: "static-v1".into() };
        let out: CacheKeysOutput = output(&keys_impl(&harness, params).await.unwrap());

        assert_eq!(
            out.urls,
            vec![
                "https://portfolio.example/",
                "https://portfolio.example/index.html",
                "https://portfolio.example/manifest.json",
            ]
        );
    }

    #[tokio::test]
    async fn test_keys_unknown_partition() {
        let (_store, _network, harness) = harness();
        let result = keys_impl(&harness, CacheKeysParams { partition: "runtime-v9".into() }).await;
        assert!(result.is_err());
    }
}
