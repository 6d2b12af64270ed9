//! Harness-level errors.
//!
//! Cache and network failures arrive as `swcache_core::Error` and convert on
//! their own; these cover what only the harness can get wrong.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use swcache_core::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A tool argument failed to parse (method, URL, version).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A per-version configuration derived from the base config was rejected.
    #[error("INVALID_INPUT: {0}")]
    Config(#[from] ConfigError),

    /// Tool output could not be encoded.
    #[error("ENCODE_FAILED: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<HarnessError> for McpError {
    fn from(err: HarnessError) -> Self {
        let code = match &err {
            HarnessError::InvalidInput(_) | HarnessError::Config(_) => -32602,
            HarnessError::Encode(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
