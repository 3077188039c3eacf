//! cache_purge tool implementation.
//!
//! Drops the cached stories, or only the staged refresh.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::stories::{STORIES_KEY, StoriesService};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Drop only the staged value and keep serving the published one.
    #[serde(default)]
    pub staged_only: Option<bool>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Whether anything was dropped.
    pub removed: bool,
}

/// Implementation of the cache_purge tool.
///
/// The persistence daemon is asked to rewrite the snapshot right away so a
/// restart does not bring the purged value back.
pub async fn purge_impl(service: &StoriesService, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let cache = service.cache();
    let removed = if params.staged_only.unwrap_or(false) {
        cache.clear_staged(STORIES_KEY).await
    } else {
        cache.remove(STORIES_KEY).await
    };

    if removed {
        tracing::info!(key = STORIES_KEY, staged_only = params.staged_only.unwrap_or(false), "cache purged");
        cache.request_persist();
    }

    let output = CachePurgeOutput { removed };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize output: {e}"), None))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
