//! In-memory slot map with expiry, staging and promotion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::Instant;

use super::snapshot::{self, CacheSnapshot, SnapshotEntry, SnapshotSlot};
use crate::Error;

/// Stand-in for "never" when an expiry would overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + after`, clamped to a far-future instant instead of overflowing.
pub(crate) fn deadline(now: Instant, after: Duration) -> Instant {
    now.checked_add(after.min(FAR_FUTURE)).unwrap_or(now)
}

/// A published value and the time it stops being served.
#[derive(Debug, Clone)]
struct Published<V> {
    value: V,
    expires_at: Instant,
    ttl: Duration,
}

impl<V> Published<V> {
    fn new(value: V, ttl: Duration, now: Instant) -> Self {
        Self { value, expires_at: deadline(now, ttl), ttl }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// One logical key: the served value plus at most one staged replacement.
#[derive(Debug, Clone)]
struct Slot<V> {
    published: Option<Published<V>>,
    pending: Option<V>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self { published: None, pending: None }
    }
}

/// Outcome of running the eviction policy on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eviction {
    /// Still fresh, or nothing to do.
    Kept,
    /// The staged value replaced the expired (or missing) published value.
    Promoted,
    /// The published value expired with nothing staged.
    Removed,
}

impl<V> Slot<V> {
    fn is_empty(&self) -> bool {
        self.published.is_none() && self.pending.is_none()
    }

    fn live(&self, now: Instant) -> Option<&Published<V>> {
        self.published.as_ref().filter(|p| !p.is_expired(now))
    }

    /// Apply the eviction policy.
    ///
    /// An expired or missing published value is replaced by the staged value
    /// when there is one, re-armed with the ttl it was published with.
    fn evict(&mut self, now: Instant, default_ttl: Duration) -> Eviction {
        if self.live(now).is_some() {
            return Eviction::Kept;
        }

        let previous = self.published.take();
        match self.pending.take() {
            Some(value) => {
                let ttl = previous.map_or(default_ttl, |p| p.ttl);
                self.published = Some(Published::new(value, ttl, now));
                Eviction::Promoted
            }
            None if previous.is_some() => Eviction::Removed,
            None => Eviction::Kept,
        }
    }
}

/// Point-in-time view of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStatus {
    /// Whether an unexpired value is being served.
    pub published: bool,
    /// Whether a staged value is waiting for promotion.
    pub staged: bool,
    /// Time left before the published value expires.
    pub expires_in: Option<Duration>,
}

/// TTL cache restored from, and persisted to, a single snapshot file.
///
/// Reads never touch the disk after [`PersistentCache::open`]. All slot
/// operations are atomic under one lock; callers run any long work (such as
/// the fetch pipeline) before calling in to publish its result.
pub struct PersistentCache<V> {
    slots: RwLock<HashMap<String, Slot<V>>>,
    path: PathBuf,
    ttl: Duration,
    /// Serializes snapshot writes.
    file_lock: Mutex<()>,
    changed: Notify,
    persist_requested: Notify,
}

impl<V> PersistentCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Open the cache, restoring the snapshot at `path` if there is one.
    ///
    /// A missing or unreadable snapshot yields an empty cache. A snapshot
    /// persisted more than `ttl` ago is discarded.
    pub async fn open(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path = path.into();

        let slots = match snapshot::read::<V>(&path).await {
            Ok(Some(snapshot)) if snapshot.is_stale(Utc::now(), ttl) => {
                tracing::info!(
                    path = %path.display(),
                    last_persisted = %snapshot.last_persisted,
                    "cache snapshot is stale, starting empty"
                );
                HashMap::new()
            }
            Ok(Some(snapshot)) => {
                let slots = restore(snapshot);
                tracing::info!(path = %path.display(), keys = slots.len(), "cache loaded from disk");
                slots
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "no cache snapshot found, starting empty");
                HashMap::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load cache, starting empty");
                HashMap::new()
            }
        };

        Self::from_slots(slots, path, ttl)
    }

    fn from_slots(slots: HashMap<String, Slot<V>>, path: PathBuf, ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(slots),
            path,
            ttl,
            file_lock: Mutex::new(()),
            changed: Notify::new(),
            persist_requested: Notify::new(),
        }
    }

    /// Default ttl, also the staleness bound for snapshots.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the current value for `key`.
    ///
    /// If the published value has expired (or was never set) and a staged
    /// value exists, the staged value is promoted and returned.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let slots = self.slots.read().await;
            let slot = slots.get(key)?;
            if let Some(published) = slot.live(Instant::now()) {
                return Some(published.value.clone());
            }
        }

        let mut slots = self.slots.write().await;
        let now = Instant::now();
        let slot = slots.get_mut(key)?;

        match slot.evict(now, self.ttl) {
            Eviction::Promoted => {
                tracing::info!(key, "promoted staged value on read");
                self.changed.notify_one();
            }
            Eviction::Removed => tracing::debug!(key, "evicted expired value on read"),
            Eviction::Kept => {}
        }

        let value = slot.live(now).map(|p| p.value.clone());
        if slot.is_empty() {
            slots.remove(key);
        }
        value
    }

    /// Publish `value` under `key`, expiring `ttl` from now.
    pub async fn set(&self, key: &str, value: V, ttl: Duration) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key.to_string()).or_default();
        slot.published = Some(Published::new(value, ttl, Instant::now()));
        drop(slots);

        self.changed.notify_one();
    }

    /// Stage `value` to replace the published value at its next eviction.
    ///
    /// Replaces any value already staged under `key`.
    pub async fn stage(&self, key: &str, value: V) {
        let mut slots = self.slots.write().await;
        slots.entry(key.to_string()).or_default().pending = Some(value);
        drop(slots);

        self.changed.notify_one();
    }

    pub async fn has_staged(&self, key: &str) -> bool {
        self.slots
            .read()
            .await
            .get(key)
            .is_some_and(|slot| slot.pending.is_some())
    }

    /// Expiry of the published value, expired or not.
    pub async fn expires_at(&self, key: &str) -> Option<Instant> {
        self.slots
            .read()
            .await
            .get(key)
            .and_then(|slot| slot.published.as_ref())
            .map(|p| p.expires_at)
    }

    pub async fn status(&self, key: &str) -> SlotStatus {
        let slots = self.slots.read().await;
        let now = Instant::now();
        let slot = slots.get(key);
        let live = slot.and_then(|s| s.live(now));

        SlotStatus {
            published: live.is_some(),
            staged: slot.is_some_and(|s| s.pending.is_some()),
            expires_in: live.map(|p| p.expires_at.saturating_duration_since(now)),
        }
    }

    /// Run the eviction policy over every key.
    ///
    /// Returns the number of keys whose value was promoted or removed.
    pub async fn evict_expired(&self) -> usize {
        let mut slots = self.slots.write().await;
        let now = Instant::now();
        let mut evicted = 0;
        let mut promoted = false;

        for (key, slot) in slots.iter_mut() {
            match slot.evict(now, self.ttl) {
                Eviction::Promoted => {
                    tracing::info!(key = %key, "promoted staged value");
                    promoted = true;
                    evicted += 1;
                }
                Eviction::Removed => {
                    tracing::info!(key = %key, "evicted expired value, nothing staged");
                    evicted += 1;
                }
                Eviction::Kept => {}
            }
        }
        slots.retain(|_, slot| !slot.is_empty());
        drop(slots);

        if promoted {
            self.changed.notify_one();
        }
        evicted
    }

    /// Remove `key` entirely. Returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> bool {
        let removed = self.slots.write().await.remove(key).is_some();
        if removed {
            self.changed.notify_one();
        }
        removed
    }

    /// Drop only the staged value of `key`. Returns whether one existed.
    pub async fn clear_staged(&self, key: &str) -> bool {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(key) else {
            return false;
        };
        let cleared = slot.pending.take().is_some();
        if slot.is_empty() {
            slots.remove(key);
        }
        drop(slots);

        if cleared {
            self.changed.notify_one();
        }
        cleared
    }

    pub async fn clear(&self) {
        self.slots.write().await.clear();
        self.changed.notify_one();
    }

    /// Resolves after the next `set`, `stage`, `remove` or promotion.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    /// Ask the persistence daemon to write a snapshot without waiting for
    /// its next period.
    pub fn request_persist(&self) {
        self.persist_requested.notify_one();
    }

    /// Resolves after the next [`PersistentCache::request_persist`].
    pub async fn persist_requested(&self) {
        self.persist_requested.notified().await;
    }

    /// Capture every slot with wall-clock expiries.
    pub async fn snapshot(&self) -> CacheSnapshot<V> {
        let slots = self.slots.read().await;
        let now = Instant::now();
        let wall_now = Utc::now();

        let entries = slots
            .iter()
            .map(|(key, slot)| {
                let published = slot.published.as_ref().map(|p| {
                    let remaining = p.expires_at.saturating_duration_since(now);
                    SnapshotEntry {
                        value: p.value.clone(),
                        expires_at: wall_now + chrono::Duration::from_std(remaining).unwrap_or_default(),
                        ttl_ms: p.ttl.as_millis() as u64,
                    }
                });
                (key.clone(), SnapshotSlot { published, pending: slot.pending.clone() })
            })
            .collect();

        CacheSnapshot { last_persisted: wall_now, entries }
    }

    /// Write the whole cache to disk.
    ///
    /// The snapshot is taken under the slot lock; the file is written
    /// after the lock is released.
    pub async fn persist(&self) -> Result<(), Error> {
        let _file = self.file_lock.lock().await;
        let snapshot = self.snapshot().await;
        snapshot::write(&self.path, &snapshot).await?;

        tracing::info!(path = %self.path.display(), keys = snapshot.entries.len(), "cache persisted to disk");
        Ok(())
    }
}

/// Convert a loaded snapshot back into slots with monotonic expiries.
fn restore<V>(snapshot: CacheSnapshot<V>) -> HashMap<String, Slot<V>> {
    let now = Instant::now();
    let wall_now = Utc::now();

    snapshot
        .entries
        .into_iter()
        .map(|(key, slot)| {
            let published = slot.published.map(|entry| {
                let remaining = (entry.expires_at - wall_now).to_std().unwrap_or(Duration::ZERO);
                Published { value: entry.value, expires_at: deadline(now, remaining), ttl: Duration::from_millis(entry.ttl_ms) }
            });
            (key, Slot { published, pending: slot.pending })
        })
        .filter(|(_, slot)| !slot.is_empty())
        .collect()
}
