//! # Membership Set
//!
//! The engine's authoritative map of saved items, keyed by [`ItemKey`].
//!
//! Every set is tagged with the session it belongs to. The engine keeps the
//! current set behind an `Arc` and swaps whole sets on reload, so a reader
//! holding a snapshot never sees a half-built map.

use crate::shared::content::{FavoriteRecord, ItemKey, ListItem};
use indexmap::IndexMap;
use std::sync::Arc;

/// Ordered `ItemKey -> ListItem` map owned by one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet {
    owner: Option<u64>,
    items: IndexMap<ItemKey, ListItem>,
}

/// Outcome of building a set from backend records
#[derive(Debug, Clone)]
pub struct Ingested {
    pub set: MembershipSet,
    /// Records that could not be turned into a [`ListItem`]
    pub dropped: usize,
}

impl MembershipSet {
    /// Empty set belonging to `owner` (`None` = anonymous)
    pub fn empty(owner: Option<u64>) -> Self {
        Self {
            owner,
            items: IndexMap::new(),
        }
    }

    /// Build a set from backend records, skipping malformed ones and
    /// collapsing duplicate keys.
    pub fn from_records(owner: u64, records: Vec<FavoriteRecord>) -> Ingested {
        let mut set = Self::empty(Some(owner));
        let mut dropped = 0;

        for record in records {
            match ListItem::try_from(record) {
                Ok(item) => {
                    set.items.entry(item.key()).or_insert(item);
                }
                Err(e) => {
                    dropped += 1;
                    tracing::warn!(error = %e, "dropping malformed list record");
                }
            }
        }

        Ingested { set, dropped }
    }

    pub fn owner(&self) -> Option<u64> {
        self.owner
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn get(&self, key: &ItemKey) -> Option<&ListItem> {
        self.items.get(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert an item; returns `false` if the key was already present
    pub fn insert(&mut self, item: ListItem) -> bool {
        let key = item.key();
        if self.items.contains_key(&key) {
            return false;
        }
        self.items.insert(key, item);
        true
    }

    /// Overwrite the metadata of an existing member
    pub fn refresh(&mut self, item: ListItem) -> bool {
        match self.items.get_mut(&item.key()) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => false,
        }
    }

    /// Remove a member, returning it with its position for a later restore
    pub fn remove(&mut self, key: &ItemKey) -> Option<(usize, ListItem)> {
        self.items
            .shift_remove_full(key)
            .map(|(index, _, item)| (index, item))
    }

    /// Put a removed member back at (or near) its old position
    pub fn restore(&mut self, index: usize, item: ListItem) -> bool {
        let key = item.key();
        if self.items.contains_key(&key) {
            return false;
        }
        let index = index.min(self.items.len());
        self.items.shift_insert(index, key, item);
        true
    }

    pub fn items(&self) -> impl Iterator<Item = &ListItem> {
        self.items.values()
    }
}

/// Display view of a membership snapshot.
///
/// Holds its own `Arc` of the set, so iterating is lazy, finite and can be
/// restarted any number of times without touching the engine again.
#[derive(Debug, Clone)]
pub struct ProjectedList {
    snapshot: Arc<MembershipSet>,
}

impl ProjectedList {
    pub(crate) fn new(snapshot: Arc<MembershipSet>) -> Self {
        Self { snapshot }
    }

    /// Items with complete metadata, in display order
    pub fn iter(&self) -> impl Iterator<Item = &ListItem> + '_ {
        self.snapshot.items().filter(|item| item.is_complete())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn keys(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.iter().map(ListItem::key)
    }

    pub fn to_vec(&self) -> Vec<ListItem> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a ProjectedList {
    type Item = &'a ListItem;
    type IntoIter = Box<dyn Iterator<Item = &'a ListItem> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
