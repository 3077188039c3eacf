//! Client code for qhn.
//!
//! This crate provides the Hacker News HTTP client and the top-stories
//! pipeline: chunked fetching, story filtering and aggregation.

pub mod aggregate;
pub mod fetch;
pub mod hn;
pub mod pipeline;
pub mod provider;
pub mod story;

#[cfg(test)]
pub(crate) mod mock;

pub use aggregate::collect;
pub use fetch::{ChunkedFetcher, FetchResult, FetchStream};
pub use hn::{HnClient, HnConfig, HnError};
pub use pipeline::top_stories;
pub use provider::ItemProvider;
pub use story::{StoryStream, host_name, qualify};
