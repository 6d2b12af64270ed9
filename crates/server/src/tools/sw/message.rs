//! sw_message tool implementation.
//!
//! Posts a page message to the registration, e.g. `SKIP_WAITING` to apply a waiting update.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::ControlMessage;

use crate::error::HarnessError;
use crate::harness::Harness;

/// Input parameters for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message data as a page would post it.
    pub data: String,
}

/// Output structure for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    /// Whether the worker recognized the message.
    pub recognized: bool,
    pub active: Option<String>,
    pub waiting: Option<String>,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(harness: &Harness, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message = harness.registration().post_message(&params.data).await?;
    let status = harness.registration().status();

    let output = SwMessageOutput {
        recognized: matches!(message, Some(ControlMessage::SkipWaiting)),
        active: status.active.map(|w| w.version),
        waiting: status.waiting.map(|w| w.version),
    };

    let json = serde_json::to_string_pretty(&output).map_err(HarnessError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
