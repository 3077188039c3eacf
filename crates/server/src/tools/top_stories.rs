//! top_stories tool implementation.
//!
//! Returns the current top stories, from cache when possible.

use qhn_core::Story;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::stories::StoriesService;

/// Output from the top_stories tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TopStoriesOutput {
    /// Stories in pipeline order.
    pub stories: Vec<Story>,
    pub count: usize,
    /// Time spent producing this answer.
    pub elapsed_ms: u64,
    /// Whether the answer came from the cache.
    pub cached: bool,
}

/// Implementation of the top_stories tool.
pub async fn top_stories_impl(service: &StoriesService) -> Result<CallToolResult, McpError> {
    let served = service.top_stories().await?;

    let output = TopStoriesOutput {
        count: served.stories.len(),
        stories: served.stories,
        elapsed_ms: served.elapsed.as_millis() as u64,
        cached: served.cached,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize stories: {e}"), None))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) fn output_text(result: &CallToolResult) -> String {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stories::testing::StaticProvider;
    use crate::stories::{PipelineRefresher, StoriesService};
    use qhn_core::PersistentCache;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn service(provider: StaticProvider, dir: &TempDir) -> StoriesService {
        let cache = Arc::new(PersistentCache::open(dir.path().join("cache.json"), Duration::from_secs(60)).await);
        StoriesService::new(PipelineRefresher::new(Arc::new(provider), 4, 5), cache)
    }

    #[tokio::test]
    async fn test_top_stories_fresh_then_cached() {
        let dir = TempDir::new().unwrap();
        let service = service(StaticProvider::up(8), &dir).await;

        let result = top_stories_impl(&service).await.unwrap();
        let output: TopStoriesOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert_eq!(output.count, 4);
        assert!(!output.cached);
        assert_eq!(output.stories[0].host, format!("news{}.example", output.stories[0].id()));

        let result = top_stories_impl(&service).await.unwrap();
        let output: TopStoriesOutput = serde_json::from_str(&output_text(&result)).unwrap();
        assert!(output.cached);
        assert_eq!(output.count, 4);
    }

    #[tokio::test]
    async fn test_top_stories_source_down() {
        let dir = TempDir::new().unwrap();
        let service = service(StaticProvider::down(), &dir).await;

        let err = top_stories_impl(&service).await.unwrap_err();
        assert_eq!(err.code.0, -32000);
    }

    #[test]
    fn test_output_serializes_flat_story_fields() {
        let story = Story {
            item: qhn_core::RawItem {
                id: 7,
                kind: Some("story".into()),
                url: Some("https://www.example.com/x".into()),
                ..Default::default()
            },
            host: "example.com".into(),
        };
        let output = TopStoriesOutput { stories: vec![story], count: 1, elapsed_ms: 12, cached: true };

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["elapsed_ms"], 12);
        assert_eq!(value["cached"], true);
        assert_eq!(value["stories"][0]["id"], 7);
        assert_eq!(value["stories"][0]["type"], "story");
        assert_eq!(value["stories"][0]["host"], "example.com");
    }
}

