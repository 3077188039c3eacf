//! The item source seam.

use qhn_core::{Error, ItemId, RawItem};

/// Source of ranked ids and individual items.
///
/// Implementations do not retry. `top_ids` fails with
/// [`Error::SourceUnavailable`], `get_item` with [`Error::ItemUnavailable`].
#[async_trait::async_trait]
pub trait ItemProvider: Send + Sync {
    /// Ranked ids, best first.
    async fn top_ids(&self) -> Result<Vec<ItemId>, Error>;

    /// A single item.
    async fn get_item(&self, id: ItemId) -> Result<RawItem, Error>;
}
