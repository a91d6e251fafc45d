//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheMatchParams, keys_impl, match_impl},
    lifecycle::{activate_impl, install_impl, status_impl},
    sw_fetch::{SwFetchParams, fetch_impl},
};

use offcache_client::FetchClient;
use offcache_core::{CacheDb, OfflineCacheManager};
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

/// The manager as wired in production.
pub type Manager = OfflineCacheManager<CacheDb, FetchClient>;

/// The main MCP server handler for offcache.
#[derive(Clone)]
pub struct OffcacheServer {
    manager: Arc<Manager>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl OffcacheServer {
    /// Create a new server handler around a manager.
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager, tool_router: Self::tool_router() }
    }

    #[tool(description = "Provision the current cache generation from the manifest. All-or-nothing.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.manager).await
    }

    #[tool(description = "Activate the installed generation and delete every other cache generation.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.manager).await
    }

    #[tool(description = "Report lifecycle state and the current cache generation.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.manager).await
    }

    /// Answer a request the way an intercepted page request is answered.
    ///
    /// Cache hits never touch the network; failed navigations fall back to the cached root document.
    #[tool(description = "Fetch a URL through the offline cache. Returns the response and whether it came from cache, network or the offline fallback.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.manager, params.0).await
    }

    #[tool(description = "List cache generations with their entry counts.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.manager).await
    }

    #[tool(description = "Look up a stored entry by URL in a cache generation without using the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.manager, params.0).await
    }
}

impl ServerHandler for OffcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
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
