//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::stories::StoriesService;
use crate::tools::cache::{CachePurgeParams, purge_impl, status_impl};
use crate::tools::top_stories_impl;

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

/// The main MCP server handler for qhn.
#[derive(Clone)]
pub struct QhnServer {
    service: Arc<StoriesService>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl QhnServer {
    /// Create a new server handler.
    pub fn new(service: Arc<StoriesService>) -> Self {
        Self { service, tool_router: Self::tool_router() }
    }

    /// Current top stories that link out, with their host names.
    #[tool(
        description = "Get the current Hacker News top stories that link to external sites. Served from cache when fresh."
    )]
    async fn top_stories(&self) -> Result<CallToolResult, McpError> {
        top_stories_impl(&self.service).await
    }

    #[tool(description = "Show whether top stories are cached or staged, and how long the cached list stays fresh.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.service).await
    }

    /// Drop cached stories so the next request refetches.
    #[tool(description = "Purge the cached top stories. Set staged_only to drop only the pre-fetched refresh.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.service, params.0).await
    }
}

impl ServerHandler for QhnServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "qhn".into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stories::PipelineRefresher;
    use crate::stories::testing::StaticProvider;
    use qhn_core::PersistentCache;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lists_every_tool() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(PersistentCache::open(dir.path().join("cache.json"), Duration::from_secs(60)).await);
        let service = StoriesService::new(PipelineRefresher::new(Arc::new(StaticProvider::up(1)), 1, 1), cache);
        let server = QhnServer::new(Arc::new(service));

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["cache_purge", "cache_status", "top_stories"]);
        assert_eq!(server.get_info().server_info.name, "qhn");
    }
}
