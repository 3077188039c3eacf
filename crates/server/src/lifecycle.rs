//! Background daemons and their shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use qhn_core::{PersistDaemon, PersistentCache, RefreshDaemon, Story};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::stories::{PipelineRefresher, STORIES_KEY};

/// The refresh and persist daemons of one story cache.
pub struct Daemons {
    shutdown: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Daemons {
    pub fn spawn(
        cache: &Arc<PersistentCache<Vec<Story>>>, pipeline: PipelineRefresher, lead: Duration, persist_period: Duration,
    ) -> Self {
        let shutdown = CancellationToken::new();

        let refresher = RefreshDaemon::new(Arc::clone(cache), pipeline, STORIES_KEY, lead);
        let refresh = tokio::spawn(refresher.run(shutdown.clone()));
        let persist = tokio::spawn(PersistDaemon::new(Arc::clone(cache), persist_period).run(shutdown.clone()));

        Self { shutdown, handles: vec![("refresh", refresh), ("persist", persist)] }
    }

    /// Signal shutdown and wait for both daemons, including the final snapshot.
    pub async fn stop(self) {
        self.shutdown.cancel();
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::warn!(daemon = name, error = %e, "daemon task failed");
            }
        }
    }
}

/// Drive `serving` to completion, then stop the daemons whatever the outcome.
pub async fn run_until_stopped<F>(daemons: Daemons, serving: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let served = serving.await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "server stopped with an error");
    }

    daemons.stop().await;
    tracing::info!("qhn server stopped");
    served
}
