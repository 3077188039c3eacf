//! MCP tool implementations.
//!
//! This module contains all tools exposed by the qhn server.

pub mod cache;
pub mod top_stories;

pub use top_stories::{TopStoriesOutput, top_stories_impl};
