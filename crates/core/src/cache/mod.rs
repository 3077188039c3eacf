//! Disk-persisted TTL cache with staged refresh.
//!
//! This module provides an in-memory key/value cache that is restored from a
//! JSON snapshot at startup and written back periodically. It supports:
//!
//! - Per-key `{published, pending}` slots, where a staged (pending) value is
//!   promoted in one atomic step when the published value expires
//! - Atomic snapshot writes (temp file + rename)
//! - A refresh daemon that stages a fresh value shortly before expiry
//! - A persistence daemon with a final flush on shutdown

pub mod daemon;
pub mod snapshot;
pub mod store;

pub use daemon::{PersistDaemon, RefreshDaemon, Refresher};
pub use snapshot::CacheSnapshot;
pub use store::{PersistentCache, SlotStatus};
