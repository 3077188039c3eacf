//! Request path for top stories: cache first, pipeline on miss.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use qhn_client::{ItemProvider, top_stories};
use qhn_core::{Error, PersistentCache, Refresher, Story, TopStories};

/// Cache key holding the current top-stories list.
pub const STORIES_KEY: &str = "top_stories";

/// Runs the top-stories pipeline with fixed parameters.
///
/// Shared by the request path and the refresh daemon.
#[derive(Clone)]
pub struct PipelineRefresher {
    provider: Arc<dyn ItemProvider>,
    num_stories: usize,
    width: usize,
}

impl PipelineRefresher {
    pub fn new(provider: Arc<dyn ItemProvider>, num_stories: usize, width: usize) -> Self {
        Self { provider, num_stories, width }
    }

    pub async fn run(&self) -> Result<TopStories, Error> {
        top_stories(Arc::clone(&self.provider), self.num_stories, self.width).await
    }
}

#[async_trait]
impl Refresher<Vec<Story>> for PipelineRefresher {
    async fn refresh(&self) -> Result<Vec<Story>, Error> {
        Ok(self.run().await?.stories)
    }
}

/// A top-stories answer and where it came from.
#[derive(Debug, Clone)]
pub struct Served {
    pub stories: Vec<Story>,
    pub elapsed: Duration,
    pub cached: bool,
}

pub struct StoriesService {
    pipeline: PipelineRefresher,
    cache: Arc<PersistentCache<Vec<Story>>>,
}

impl StoriesService {
    pub fn new(pipeline: PipelineRefresher, cache: Arc<PersistentCache<Vec<Story>>>) -> Self {
        Self { pipeline, cache }
    }

    pub fn cache(&self) -> &PersistentCache<Vec<Story>> {
        &self.cache
    }

    /// Serve the cached list, or run the pipeline and publish its result.
    ///
    /// A failed pipeline run leaves the cache untouched.
    pub async fn top_stories(&self) -> Result<Served, Error> {
        let started = Instant::now();
        if let Some(stories) = self.cache.get(STORIES_KEY).await {
            tracing::debug!(stories = stories.len(), "serving top stories from cache");
            return Ok(Served { stories, elapsed: started.elapsed(), cached: true });
        }

        let top = self.pipeline.run().await?;
        self.cache
            .set(STORIES_KEY, top.stories.clone(), self.cache.ttl())
            .await;

        Ok(Served { stories: top.stories, elapsed: top.elapsed, cached: false })
    }
}
