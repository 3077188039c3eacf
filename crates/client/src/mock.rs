//! In-memory provider for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use qhn_core::{Error, ItemId, RawItem};

use crate::provider::ItemProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Started(ItemId),
    Finished(ItemId),
}

/// Provider with scripted items, failures and per-item latency.
#[derive(Default)]
pub(crate) struct MockProvider {
    ids: Vec<ItemId>,
    ids_unavailable: bool,
    items: HashMap<ItemId, RawItem>,
    failures: HashSet<ItemId>,
    delays: HashMap<ItemId, Duration>,
    events: Mutex<Vec<Event>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

pub(crate) fn story(id: ItemId) -> RawItem {
    RawItem {
        id,
        kind: Some("story".into()),
        title: Some(format!("Story {id}")),
        url: Some(format!("https://www.site{id}.example/post")),
        ..Default::default()
    }
}

pub(crate) fn comment(id: ItemId) -> RawItem {
    RawItem { id, kind: Some("comment".into()), text: Some("first".into()), ..Default::default() }
}

impl MockProvider {
    /// Every id in `ids` is a comment unless overridden.
    pub(crate) fn new(ids: impl IntoIterator<Item = ItemId>) -> Self {
        let ids: Vec<ItemId> = ids.into_iter().collect();
        let items = ids.iter().map(|&id| (id, comment(id))).collect();
        Self { ids, items, ..Default::default() }
    }

    pub(crate) fn unavailable() -> Self {
        Self { ids_unavailable: true, ..Default::default() }
    }

    pub(crate) fn with_item(mut self, item: RawItem) -> Self {
        self.items.insert(item.id, item);
        self
    }

    pub(crate) fn with_stories(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        for id in ids {
            self.items.insert(id, story(id));
        }
        self
    }

    pub(crate) fn with_failures(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.failures.extend(ids);
        self
    }

    pub(crate) fn with_delay(mut self, id: ItemId, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn started(&self) -> Vec<ItemId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(id) => Some(id),
                Event::Finished(_) => None,
            })
            .collect()
    }

    pub(crate) fn finished(&self) -> Vec<ItemId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finished(id) => Some(id),
                Event::Started(_) => None,
            })
            .collect()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ItemProvider for MockProvider {
    async fn top_ids(&self) -> Result<Vec<ItemId>, Error> {
        if self.ids_unavailable {
            return Err(Error::SourceUnavailable("status 503".into()));
        }
        Ok(self.ids.clone())
    }

    async fn get_item(&self, id: ItemId) -> Result<RawItem, Error> {
        self.events.lock().unwrap().push(Event::Started(id));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::Finished(id));

        if self.failures.contains(&id) {
            return Err(Error::ItemUnavailable { id, reason: "status 500".into() });
        }
        self.items
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::ItemUnavailable { id, reason: "not found".into() })
    }
}
