//! On-disk snapshot format and file I/O.
//!
//! A snapshot is a single JSON document holding every cache slot and the
//! time it was written. Expiries are stored as absolute UTC timestamps so
//! they survive a restart.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::Error;

/// The unit written to and read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot<V> {
    pub last_persisted: DateTime<Utc>,
    pub entries: HashMap<String, SnapshotSlot<V>>,
}

/// Serialized form of one cache slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSlot<V> {
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub published: Option<SnapshotEntry<V>>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub pending: Option<V>,
}

/// Serialized form of a published value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry<V> {
    pub value: V,
    pub expires_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl<V> CacheSnapshot<V> {
    /// Whether the snapshot is older than `ttl` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: std::time::Duration) -> bool {
        match (now - self.last_persisted).to_std() {
            Ok(age) => age > ttl,
            // written "in the future" (clock skew); treat as fresh
            Err(_) => false,
        }
    }
}

/// Read a snapshot from `path`.
///
/// Returns `Ok(None)` when the file does not exist.
pub async fn read<V: DeserializeOwned>(path: &Path) -> Result<Option<CacheSnapshot<V>>, Error> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::CacheLoad(format!("failed to read {}: {e}", path.display()))),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| Error::CacheLoad(format!("failed to decode {}: {e}", path.display())))
}

/// Write a snapshot to `path`, replacing the previous file atomically.
pub async fn write<V: Serialize>(path: &Path, snapshot: &CacheSnapshot<V>) -> Result<(), Error> {
    let bytes = serde_json::to_vec(snapshot).map_err(|e| Error::CachePersist(format!("failed to encode: {e}")))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::CachePersist(format!("failed to create {}: {e}", parent.display())))?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, &bytes)
        .await
        .map_err(|e| Error::CachePersist(format!("failed to write {}: {e}", temp_path.display())))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::CachePersist(format!("failed to replace {}: {e}", path.display())))?;

    Ok(())
}
