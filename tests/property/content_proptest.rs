//! Property-based tests for content ids and item keys

use flixlist::shared::{ContentId, ContentKind, FavoriteRecord, ItemKey, ListItem};
use proptest::prelude::*;

fn kind() -> impl Strategy<Value = ContentKind> {
    prop_oneof![Just(ContentKind::Movie), Just(ContentKind::Series)]
}

proptest! {
    #[test]
    fn test_item_key_display_parses_back(id in 1u64..=u64::MAX, kind in kind()) {
        let key = ItemKey::new(kind, ContentId::new(id));
        let parsed: ItemKey = key.to_string().parse().unwrap();
        prop_assert_eq!(parsed, key);
    }

    #[test]
    fn test_string_and_integer_ids_agree(id in 1u64..=u64::from(u32::MAX), kind in kind()) {
        let as_string: FavoriteRecord = serde_json::from_value(serde_json::json!({
            "tmdb_id": id.to_string(), "media_type": kind.wire_name()
        })).unwrap();
        let as_number: FavoriteRecord = serde_json::from_value(serde_json::json!({
            "tmdb_id": id, "media_type": kind.wire_name()
        })).unwrap();

        let a = ListItem::try_from(as_string).unwrap();
        let b = ListItem::try_from(as_number).unwrap();
        prop_assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_non_numeric_ids_are_rejected(raw in "[a-zA-Z_ ]{1,12}") {
        prop_assert!(ContentId::parse(&raw).is_err());
    }
}
