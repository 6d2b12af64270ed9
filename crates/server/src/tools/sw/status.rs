//! sw_status tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::WorkerInfo;

use crate::error::HarnessError;
use crate::harness::Harness;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSummary {
    pub version: String,
    /// parsed, installing, installed, activating, activated or redundant.
    pub state: String,
}

impl From<WorkerInfo> for WorkerSummary {
    fn from(info: WorkerInfo) -> Self {
        Self { version: info.version, state: info.state.to_string() }
    }
}

/// Output structure for sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub active: Option<WorkerSummary>,
    pub waiting: Option<WorkerSummary>,
    /// Version controlling open pages.
    pub controller: Option<String>,
    /// Every partition currently in the store.
    pub partitions: Vec<String>,
}

/// Implementation of the sw_status tool.
pub async fn status_impl(harness: &Harness) -> Result<CallToolResult, McpError> {
    let status = harness.registration().status();
    let partitions = harness.store().partition_names().await?;

    let output = SwStatusOutput {
        active: status.active.map(WorkerSummary::from),
        waiting: status.waiting.map(WorkerSummary::from),
        controller: status.controller,
        partitions,
    };

    let json = serde_json::to_string_pretty(&output).map_err(HarnessError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
