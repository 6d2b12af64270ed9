//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::harness::Harness;
use crate::tools::cache::{CacheGetParams, CacheKeysParams, get_impl, keys_impl};
use crate::tools::sw::{
    SwFetchParams, SwMessageParams, SwUpdateParams, fetch_impl, message_impl, status_impl, update_impl,
};

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    harness: Arc<Harness>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    pub fn new(harness: Arc<Harness>) -> Self {
        Self { harness, tool_router: Self::tool_router() }
    }

    /// Dispatch a fetch event.
    ///
    /// Without an active worker the request goes straight to the network.
    #[tool(
        description = "Dispatch a fetch event through the active worker. Returns status, headers, body, the strategy used and whether the response came from the network, the cache or a fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.harness, params.0).await
    }

    #[tool(description = "Post a page message to the worker, e.g. SKIP_WAITING to apply a waiting update.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.harness, params.0).await
    }

    /// Register a worker for a new build version.
    #[tool(
        description = "Deploy a new version: installs a worker for it, then activates it or leaves it waiting. Returns active and waiting workers."
    )]
    async fn sw_update(&self, params: Parameters<SwUpdateParams>) -> Result<CallToolResult, McpError> {
        update_impl(&self.harness, params.0).await
    }

    #[tool(description = "Show active and waiting workers, the controlling version and all cache partitions.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.harness).await
    }

    #[tool(description = "Read one stored response from a cache partition.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.harness, params.0).await
    }

    #[tool(description = "List the request URLs stored in a cache partition.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.harness, params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline caching proxy. Use sw_fetch to issue requests through the worker, sw_update to deploy a new version and cache_* to inspect partitions."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
