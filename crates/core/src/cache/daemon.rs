//! Background refresh and persistence daemons.
//!
//! # Refresh
//!
//! [`RefreshDaemon`] watches one key. It wakes `lead` before the published
//! value expires, runs the [`Refresher`] outside of any cache lock and stages
//! the result, then wakes again at expiry to promote it. Every promotion
//! re-arms the expiry, so the next wake is anchored to the new expiry rather
//! than to a fixed period.
//!
//! # Persistence
//!
//! [`PersistDaemon`] is the only writer of the snapshot file. It writes every
//! `period`, whenever [`PersistentCache::request_persist`] is called, and
//! once more when shutdown is signalled.
//!
//! # Example
//!
//! ```ignore
//! let shutdown = CancellationToken::new();
//! tokio::spawn(RefreshDaemon::new(cache.clone(), refresher, "top_stories", lead).run(shutdown.clone()));
//! tokio::spawn(PersistDaemon::new(cache.clone(), ttl + margin).run(shutdown.clone()));
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::store::{PersistentCache, deadline};
use crate::Error;

/// Produces a fresh value for a cache key.
#[async_trait::async_trait]
pub trait Refresher<V>: Send + Sync {
    async fn refresh(&self) -> Result<V, Error>;
}

/// Background daemon that stages a fresh value before the current one expires.
pub struct RefreshDaemon<V, R> {
    cache: Arc<PersistentCache<V>>,
    refresher: R,
    key: String,
    lead: Duration,
}

impl<V, R> RefreshDaemon<V, R>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    R: Refresher<V>,
{
    /// Creates a refresh daemon for `key`.
    ///
    /// `lead` is clamped below the cache ttl.
    pub fn new(cache: Arc<PersistentCache<V>>, refresher: R, key: impl Into<String>, lead: Duration) -> Self {
        let lead = lead.min(cache.ttl().saturating_sub(Duration::from_millis(1)));
        Self { cache, refresher, key: key.into(), lead }
    }

    /// Wake period while nothing is published.
    fn idle_period(&self) -> Duration {
        self.cache.ttl().saturating_sub(self.lead).max(Duration::from_millis(1))
    }

    /// Runs the daemon until shutdown is signalled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            key = %self.key,
            ttl_secs = self.cache.ttl().as_secs(),
            lead_secs = self.lead.as_secs(),
            "refresh daemon starting"
        );

        self.cache.evict_expired().await;

        // expiry for which a refresh has already been attempted
        let mut attempted: Option<Instant> = None;

        loop {
            let wake = self.next_wake(attempted).await;

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!(key = %self.key, "refresh daemon shutting down");
                    break;
                }

                _ = self.cache.changed() => continue,

                _ = tokio::time::sleep_until(wake) => {}
            }

            attempted = self.tick(attempted, &shutdown).await;
        }
    }

    async fn next_wake(&self, attempted: Option<Instant>) -> Instant {
        let now = Instant::now();
        let Some(expires_at) = self.cache.expires_at(&self.key).await else {
            return deadline(now, self.idle_period());
        };

        if attempted == Some(expires_at) || self.cache.has_staged(&self.key).await {
            expires_at
        } else {
            expires_at.checked_sub(self.lead).unwrap_or(now)
        }
    }

    async fn tick(&self, attempted: Option<Instant>, shutdown: &CancellationToken) -> Option<Instant> {
        let was_published = self.cache.expires_at(&self.key).await.is_some();
        self.cache.evict_expired().await;

        let staged = self.cache.has_staged(&self.key).await;
        match self.cache.expires_at(&self.key).await {
            Some(expires_at) => {
                let due = expires_at.checked_sub(self.lead).is_none_or(|at| at <= Instant::now());
                if due && !staged && attempted != Some(expires_at) {
                    self.prefetch(shutdown).await;
                    return Some(expires_at);
                }
                attempted
            }
            // expired with nothing staged: the next request refetches on demand
            None if was_published => {
                debug!(key = %self.key, "value expired without a staged replacement");
                None
            }
            None => {
                if !staged {
                    self.prefetch(shutdown).await;
                }
                // nothing is published, so a staged value can go live now
                self.cache.evict_expired().await;
                None
            }
        }
    }

    async fn prefetch(&self, shutdown: &CancellationToken) {
        info!(key = %self.key, "pre-fetching");

        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!(key = %self.key, "pre-fetch abandoned on shutdown");
                return;
            }
            result = self.refresher.refresh() => result,
        };

        match result {
            Ok(value) => {
                self.cache.stage(&self.key, value).await;
                info!(key = %self.key, "pre-fetched and staged");
            }
            Err(e) => warn!(key = %self.key, error = %e, "pre-fetch failed"),
        }
    }
}

/// Background daemon that persists the cache periodically.
pub struct PersistDaemon<V> {
    cache: Arc<PersistentCache<V>>,
    period: Duration,
}

impl<V> PersistDaemon<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(cache: Arc<PersistentCache<V>>, period: Duration) -> Self {
        Self { cache, period: period.max(Duration::from_millis(1)) }
    }

    /// Runs the daemon until shutdown is signalled, then persists once more.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(period_secs = self.period.as_secs(), path = %self.cache.path().display(), "persist daemon starting");

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first immediate tick
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                _ = interval.tick() => self.persist().await,

                _ = self.cache.persist_requested() => {
                    debug!("persist requested");
                    self.persist().await;
                }
            }
        }

        info!("persist daemon shutting down, writing final snapshot");
        self.persist().await;
    }

    async fn persist(&self) {
        if let Err(e) = self.cache.persist().await {
            warn!(error = %e, "failed to persist cache, continuing in memory");
        }
    }
}
