//! Chunked, bounded-concurrency item fetching.
//!
//! ### Chunking
//! - The id list is split into consecutive chunks of `width` ids.
//! - Every id of a chunk is fetched concurrently; results are emitted in
//!   completion order.
//! - A chunk is joined completely before the next one starts.
//! - At most one result is buffered, so the next chunk cannot start until the
//!   consumer has read all but the last result of the current one.
//!
//! ### Cancellation
//! - Cooperative, via a [`CancellationToken`] shared with every fetch task.
//! - Tasks check the token before and after their request.
//! - On cancellation the coordinator stops forwarding, joins every task of
//!   the current chunk and exits. It never waits on a consumer that has
//!   stopped reading.
//!
//! ### Failures
//! - A failed item is logged and emitted as `Err`; the chunk carries on.

use std::sync::Arc;

use qhn_core::{Error, ItemId, RawItem};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::provider::ItemProvider;

/// Outcome of fetching one id.
pub type FetchResult = Result<RawItem, Error>;

/// Fetches ids in sequential chunks of parallel requests.
pub struct ChunkedFetcher<P: ?Sized> {
    provider: Arc<P>,
    width: usize,
}

impl<P> ChunkedFetcher<P>
where
    P: ItemProvider + ?Sized + 'static,
{
    /// Create a fetcher that runs `width` requests per chunk.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `width` is 0.
    pub fn new(provider: Arc<P>, width: usize) -> Result<Self, Error> {
        if width == 0 {
            return Err(Error::InvalidInput("fetch width must be at least 1".into()));
        }
        Ok(Self { provider, width })
    }

    /// Start fetching `ids` in the background.
    ///
    /// Must be called within a Tokio runtime.
    pub fn fetch(&self, ids: Vec<ItemId>, cancel: CancellationToken) -> FetchStream {
        let (tx, rx) = mpsc::channel(1);
        let coordinator = tokio::spawn(coordinate(Arc::clone(&self.provider), ids, self.width, tx, cancel.clone()));

        FetchStream { rx, cancel, coordinator }
    }
}

/// Receiving end of a running fetch.
pub struct FetchStream {
    rx: mpsc::Receiver<FetchResult>,
    cancel: CancellationToken,
    coordinator: JoinHandle<()>,
}

impl FetchStream {
    /// Next result, or `None` once every chunk is done or the fetch stopped.
    pub async fn next(&mut self) -> Option<FetchResult> {
        self.rx.recv().await
    }

    /// Ask the fetcher to stop after draining the current chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait until every in-flight request has been drained.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        drop(self.rx);
        if let Err(e) = self.coordinator.await {
            tracing::warn!("fetch coordinator failed: {e}");
        }
    }
}

async fn coordinate<P>(
    provider: Arc<P>, ids: Vec<ItemId>, width: usize, tx: mpsc::Sender<FetchResult>, cancel: CancellationToken,
) where
    P: ItemProvider + ?Sized + 'static,
{
    for (index, chunk) in ids.chunks(width).enumerate() {
        if cancel.is_cancelled() {
            tracing::debug!("fetch cancelled before chunk {}", index);
            break;
        }

        let mut tasks = JoinSet::new();
        for &id in chunk {
            tasks.spawn(fetch_one(Arc::clone(&provider), id, cancel.clone()));
        }

        let mut forwarding = true;
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(Some(result)) => result,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("fetch task failed: {e}");
                    continue;
                }
            };

            // keep joining after a stop so no task outlives the chunk
            if !forwarding {
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => forwarding = false,
                sent = tx.send(result) => {
                    if sent.is_err() {
                        forwarding = false;
                    }
                }
            }
        }

        if !forwarding {
            tracing::debug!("fetch stopped during chunk {}, drained {} ids", index, chunk.len());
            break;
        }
        tracing::debug!("fetched chunk {} ({} ids)", index, chunk.len());
    }
}

/// Fetch one id, or `None` if the fetch was cancelled around it.
async fn fetch_one<P>(provider: Arc<P>, id: ItemId, cancel: CancellationToken) -> Option<FetchResult>
where
    P: ItemProvider + ?Sized,
{
    if cancel.is_cancelled() {
        return None;
    }

    let result = provider.get_item(id).await;
    if let Err(e) = &result {
        tracing::warn!(id, error = %e, "item fetch failed");
    }

    if cancel.is_cancelled() {
        return None;
    }
    Some(result)
}
