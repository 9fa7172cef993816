//! Property-based tests for membership sets

use flixlist::client::sync::MembershipSet;
use flixlist::shared::{ContentId, ContentKind, ItemKey, ListItem};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Step {
    Insert(u64, bool),
    Remove(u64, bool),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u64..20, any::<bool>()).prop_map(|(id, series)| Step::Insert(id, series)),
        (1u64..20, any::<bool>()).prop_map(|(id, series)| Step::Remove(id, series)),
    ]
}

fn kind(series: bool) -> ContentKind {
    if series {
        ContentKind::Series
    } else {
        ContentKind::Movie
    }
}

proptest! {
    /// The set behaves like a set of keys, one entry per key
    #[test]
    fn test_set_matches_model(steps in prop::collection::vec(step(), 0..60)) {
        let mut set = MembershipSet::empty(Some(1));
        let mut model: HashSet<ItemKey> = HashSet::new();

        for step in steps {
            match step {
                Step::Insert(id, series) => {
                    let item = ListItem::new(ContentId::new(id), kind(series));
                    prop_assert_eq!(set.insert(item.clone()), model.insert(item.key()));
                }
                Step::Remove(id, series) => {
                    let key = ItemKey::new(kind(series), ContentId::new(id));
                    prop_assert_eq!(set.remove(&key).is_some(), model.remove(&key));
                }
            }
        }

        prop_assert_eq!(set.len(), model.len());
        for key in &model {
            prop_assert!(set.contains(key));
        }
    }

    /// Removing then restoring any member gives back the same ordered set
    #[test]
    fn test_remove_restore_is_identity(ids in prop::collection::hash_set(1u64..500, 1..30), pick in any::<prop::sample::Index>()) {
        let mut set = MembershipSet::empty(Some(1));
        for id in &ids {
            set.insert(ListItem::new(ContentId::new(*id), ContentKind::Movie));
        }
        let before: Vec<ListItem> = set.items().cloned().collect();

        let keys: Vec<ItemKey> = set.items().map(ListItem::key).collect();
        let key = keys[pick.index(keys.len())];
        let (index, item) = set.remove(&key).unwrap();
        prop_assert!(set.restore(index, item));
        let after: Vec<ListItem> = set.items().cloned().collect();
        prop_assert_eq!(after, before);
    }
}
