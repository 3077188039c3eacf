//! Item types exchanged between the provider, the pipeline and the cache.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier of an item in the ranking source.
pub type ItemId = u64;

/// An item as returned by the ranking source.
///
/// Every field other than `id` may be absent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawItem {
    pub id: ItemId,
    /// Item kind: "story", "comment", "job", "poll" or "pollopt".
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    /// Creation time in Unix seconds.
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub descendants: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kids: Vec<ItemId>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// A story that links out, with the host name of its link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Story {
    #[serde(flatten)]
    pub item: RawItem,
    /// Lowercased host of `item.url` without a leading `www.`.
    pub host: String,
}

impl Story {
    pub fn id(&self) -> ItemId {
        self.item.id
    }

    pub fn url(&self) -> &str {
        self.item.url.as_deref().unwrap_or_default()
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct TopStories {
    pub stories: Vec<Story>,
    /// Time from the start of the run until aggregation finished.
    pub elapsed: Duration,
}
