//! MCP server handler implementation.
//!
//! This module defines the host handler that routes tool calls to the
//! lifecycle, fetch and cache tool implementations.
use std::sync::Arc;

use crate::registration::Registration;
use crate::tools::cache::{CacheKeysParams, keys_impl, list_impl};
use crate::tools::lifecycle::{activate_impl, install_impl};
use crate::tools::sw_fetch::{SwFetchParams, fetch_impl};

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
use shellcache_client::{CacheWorker, Transport};

/// Host for one deployed worker version.
#[derive(Clone)]
pub struct ShellCacheServer {
    worker: Arc<CacheWorker>,
    registration: Arc<Registration>,
    /// Default network handling for requests the worker does not claim.
    transport: Arc<dyn Transport>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ShellCacheServer {
    pub fn new(worker: Arc<CacheWorker>, registration: Arc<Registration>, transport: Arc<dyn Transport>) -> Self {
        Self { worker, registration, transport, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Fire the install event: open the versioned cache and precache the app shell. Activates immediately when the worker skips waiting."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker, &self.registration).await
    }

    #[tool(description = "Fire the activate event: delete every cache store of other versions and claim all clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker, &self.registration).await
    }

    /// Deliver a fetch event.
    ///
    /// Requests the active worker does not claim are fetched by the host.
    #[tool(
        description = "Deliver a fetch event for a URL. Returns status, response type, content type, body and where the response came from (cache, network, offline, passthrough)."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, &self.registration, self.transport.as_ref(), params.0).await
    }

    #[tool(description = "List cache store names and the current version's store.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.worker).await
    }

    #[tool(description = "List the request URLs stored in a cache store (default: current version).")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache-mcp".into(),
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
