//! The top-stories pipeline: list ids, fetch in chunks, filter, collect.

use std::sync::Arc;
use std::time::Instant;

use qhn_core::{Error, TopStories};
use tokio_util::sync::CancellationToken;

use crate::aggregate::collect;
use crate::fetch::ChunkedFetcher;
use crate::provider::ItemProvider;
use crate::story::StoryStream;

/// Fetch the current top `n` stories, `width` items at a time.
///
/// # Errors
///
/// - `Error::InvalidInput` if `width` is 0
/// - `Error::SourceUnavailable` if the id list cannot be retrieved; no
///   partial result is produced
///
/// Individual item failures only shorten the candidate list.
pub async fn top_stories<P>(provider: Arc<P>, n: usize, width: usize) -> Result<TopStories, Error>
where
    P: ItemProvider + ?Sized + 'static,
{
    let started = Instant::now();
    let fetcher = ChunkedFetcher::new(Arc::clone(&provider), width)?;

    let ids = provider.top_ids().await.map_err(|e| match e {
        Error::SourceUnavailable(_) => e,
        other => Error::SourceUnavailable(other.to_string()),
    })?;
    tracing::debug!("listed {} ids, fetching {} at a time", ids.len(), width);

    let stream = StoryStream::new(fetcher.fetch(ids, CancellationToken::new()), n);
    let top = collect(stream, n, started).await;

    tracing::info!(
        stories = top.stories.len(),
        requested = n,
        elapsed_ms = top.elapsed.as_millis() as u64,
        "collected top stories"
    );
    Ok(top)
}
