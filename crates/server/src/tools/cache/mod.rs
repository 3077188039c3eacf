//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and purging the story cache.

pub mod purge;
pub mod status;

pub use purge::{CachePurgeParams, purge_impl};
pub use status::status_impl;
