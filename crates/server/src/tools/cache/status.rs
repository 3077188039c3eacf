//! cache_status tool implementation.
//!
//! Reports what the story cache currently holds.

use qhn_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::stories::{STORIES_KEY, StoriesService};

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    pub key: String,
    /// A live value is being served.
    pub published: bool,
    /// A pre-fetched value is waiting for the next eviction.
    pub staged: bool,
    /// Seconds until the published value expires.
    pub expires_in_secs: Option<u64>,
    /// Location of the on-disk snapshot.
    pub path: String,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(service: &StoriesService) -> Result<CallToolResult, McpError> {
    let cache = service.cache();
    let status = cache.status(STORIES_KEY).await;
    if !status.published && !status.staged {
        return Err(Error::CacheMiss(STORIES_KEY.to_string()).into());
    }

    let output = CacheStatusOutput {
        key: STORIES_KEY.to_string(),
        published: status.published,
        staged: status.staged,
        expires_in_secs: status.expires_in.map(|d| d.as_secs()),
        path: cache.path().display().to_string(),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize output: {e}"), None))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stories::PipelineRefresher;
    use crate::stories::testing::StaticProvider;
    use crate::tools::top_stories::output_text;
    use qhn_core::PersistentCache;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn service(dir: &TempDir) -> StoriesService {
        let cache = Arc::new(PersistentCache::open(dir.path().join("cache.json"), Duration::from_secs(600)).await);
        StoriesService::new(PipelineRefresher::new(Arc::new(StaticProvider::up(3)), 3, 3), cache)
    }

    #[tokio::test]
    async fn test_status_empty_cache() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir).await;

        let err = status_impl(&service).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_status_after_fetch() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir).await;
        service.top_stories().await.unwrap();

        let result = status_impl(&service).await.unwrap();
        let output: CacheStatusOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert!(output.published);
        assert!(!output.staged);
        let expires_in = output.expires_in_secs.unwrap();
        assert!(expires_in > 590 && expires_in <= 600);
        assert!(output.path.ends_with("cache.json"));
    }

    #[tokio::test]
    async fn test_status_staged_only() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir).await;
        service.cache().stage(STORIES_KEY, vec![]).await;

        let result = status_impl(&service).await.unwrap();
        let output: CacheStatusOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert!(!output.published);
        assert!(output.staged);
        assert_eq!(output.expires_in_secs, None);
    }
}
