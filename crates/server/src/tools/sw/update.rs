//! sw_update tool implementation.
//!
//! Simulates a deployment: registers a worker built for a new version.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::harness::Harness;
use crate::tools::sw::status::WorkerSummary;

/// Input parameters for sw_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwUpdateParams {
    /// Build version of the new worker. Used verbatim in partition names.
    pub version: String,
}

/// Output structure for sw_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwUpdateOutput {
    pub active: Option<WorkerSummary>,
    pub waiting: Option<WorkerSummary>,
    pub controller: Option<String>,
}

/// Implementation of the sw_update tool.
pub async fn update_impl(harness: &Harness, params: SwUpdateParams) -> Result<CallToolResult, McpError> {
    let config = harness.config_for(&params.version)?;
    let worker = harness.registration().worker_for(&config)?;
    let status = harness.registration().register(worker).await?;

    let output = SwUpdateOutput {
        active: status.active.map(WorkerSummary::from),
        waiting: status.waiting.map(WorkerSummary::from),
        controller: status.controller,
    };

    let json = serde_json::to_string_pretty(&output).map_err(HarnessError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
