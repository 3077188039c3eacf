//! Pull-based stream of qualifying stories over a running fetch.

use qhn_core::Story;

use super::qualify;
use crate::fetch::FetchStream;

/// Filters a [`FetchStream`] down to at most `limit` stories.
///
/// Failed fetches and non-qualifying items are dropped in place. Once
/// `limit` stories have been handed out the upstream fetch is cancelled.
pub struct StoryStream {
    upstream: FetchStream,
    limit: usize,
    emitted: usize,
}

impl StoryStream {
    pub fn new(upstream: FetchStream, limit: usize) -> Self {
        if limit == 0 {
            upstream.cancel();
        }
        Self { upstream, limit, emitted: 0 }
    }

    /// Next qualifying story, or `None` when the limit is reached or the
    /// fetch is exhausted.
    pub async fn next(&mut self) -> Option<Story> {
        if self.emitted >= self.limit {
            return None;
        }

        while let Some(result) = self.upstream.next().await {
            let Ok(item) = result else {
                continue;
            };
            let Some(story) = qualify(item) else {
                continue;
            };

            self.emitted += 1;
            if self.emitted >= self.limit {
                self.upstream.cancel();
            }
            return Some(story);
        }
        None
    }

    /// Number of stories handed out so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Stop the upstream fetch early.
    pub fn cancel(&self) {
        self.upstream.cancel();
    }

    /// Cancel and wait for the upstream fetch to drain.
    pub async fn shutdown(self) {
        self.upstream.shutdown().await;
    }
}
