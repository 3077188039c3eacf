//! Core types and shared functionality for qhn.
//!
//! This crate provides:
//! - Item and story types shared by the client and server
//! - Persistent TTL cache with staged refresh and its background daemons
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod item;

pub use cache::{PersistentCache, PersistDaemon, RefreshDaemon, Refresher};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use item::{ItemId, RawItem, Story, TopStories};
