//! Saved-Item Content Types
//!
//! Types describing a saved item as the list engine knows it, plus the wire
//! record the list backend stores.
//!
//! # Overview
//!
//! - [`ContentId`] - catalog identifier of a movie or series
//! - [`ContentKind`] - which catalog sub-API the id belongs to
//! - [`ItemKey`] - the `(kind, id)` uniqueness key, rendered as `"<kind>-<id>"`
//! - [`ListItem`] - one saved item with its advisory metadata
//! - [`FavoriteRecord`] - the loosely-typed record served by the backend
//!
//! # Usage
//!
//! ```rust
//! use flixlist::shared::content::{ContentId, ContentKind, ItemKey};
//!
//! let key = ItemKey::new(ContentKind::Series, ContentId::new(100));
//! assert_eq!(key.to_string(), "tv-100");
//! ```

use crate::shared::error::ListError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Catalog identifier of a saved item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(u64);

impl ContentId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Parse a wire id. Zero, negative and non-numeric ids are rejected.
    pub fn parse(raw: &str) -> Result<Self, ListError> {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(0) | Err(_) => Err(ListError::malformed(format!("invalid content id '{}'", raw))),
            Ok(id) => Ok(Self(id)),
        }
    }

    pub(crate) fn from_json(value: &serde_json::Value) -> Result<Self, ListError> {
        match value {
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(id) if id > 0 => Ok(Self(id)),
                _ => Err(ListError::malformed(format!("invalid content id {}", n))),
            },
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Null => Err(ListError::malformed("missing content id")),
            other => Err(ListError::malformed(format!("invalid content id {}", other))),
        }
    }
}

impl From<u64> for ContentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Kind of catalog content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ContentKind {
    /// Feature film (catalog `movie` endpoints)
    #[default]
    Movie,
    /// Television series (catalog `tv` endpoints)
    Series,
}

impl ContentKind {
    /// Name used on the wire and in [`ItemKey`] strings
    pub const fn wire_name(self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Series => "tv",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ContentKind {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(ContentKind::Movie),
            "tv" | "series" | "show" => Ok(ContentKind::Series),
            other => Err(ListError::malformed(format!("unknown content kind '{}'", other))),
        }
    }
}

impl Serialize for ContentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for ContentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Composite uniqueness key of a saved item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub kind: ContentKind,
    pub id: ContentId,
}

impl ItemKey {
    pub const fn new(kind: ContentKind, id: ContentId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

impl FromStr for ItemKey {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once('-')
            .ok_or_else(|| ListError::malformed(format!("invalid item key '{}'", s)))?;
        Ok(Self::new(kind.parse()?, ContentId::parse(id)?))
    }
}

/// One saved item as known to the list engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub content_id: ContentId,
    pub content_kind: ContentKind,
    /// Advisory only; never used for ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl ListItem {
    pub fn new(content_id: ContentId, content_kind: ContentKind) -> Self {
        Self {
            content_id,
            content_kind,
            added_at: None,
        }
    }

    pub fn with_added_at(mut self, added_at: DateTime<Utc>) -> Self {
        self.added_at = Some(added_at);
        self
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.content_kind, self.content_id)
    }

    /// Whether the item carries a usable content id
    pub fn is_complete(&self) -> bool {
        self.content_id.get() != 0
    }
}

/// Saved-item record as stored by the list backend.
///
/// Every field is kept as raw JSON so that one bad record can be rejected on
/// its own instead of failing the decode of the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoriteRecord {
    #[serde(default)]
    pub tmdb_id: serde_json::Value,
    #[serde(default)]
    pub media_type: serde_json::Value,
    #[serde(default, alias = "created_at", alias = "addedAt")]
    pub added_at: serde_json::Value,
}

impl FavoriteRecord {
    pub fn from_item(item: &ListItem) -> Self {
        Self {
            tmdb_id: serde_json::Value::String(item.content_id.to_string()),
            media_type: serde_json::Value::String(item.content_kind.wire_name().to_string()),
            added_at: item
                .added_at
                .map_or(serde_json::Value::Null, |t| serde_json::Value::String(t.to_rfc3339())),
        }
    }
}

/// Any JSON entry becomes a record. Entries that are not objects become an
/// empty record, which ingestion rejects as malformed.
impl From<serde_json::Value> for FavoriteRecord {
    fn from(value: serde_json::Value) -> Self {
        match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable saved-list entry");
                Self::default()
            }
        }
    }
}

fn parse_added_at(raw: &serde_json::Value) -> Option<DateTime<Utc>> {
    match raw {
        serde_json::Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        serde_json::Value::Number(secs) => {
            secs.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0))
        }
        _ => None,
    }
}

impl TryFrom<FavoriteRecord> for ListItem {
    type Error = ListError;

    fn try_from(record: FavoriteRecord) -> Result<Self, Self::Error> {
        let content_id = ContentId::from_json(&record.tmdb_id)?;
        let content_kind = match &record.media_type {
            serde_json::Value::String(kind) => kind.parse()?,
            serde_json::Value::Null => {
                return Err(ListError::malformed(format!(
                    "record {} has no media type",
                    content_id
                )))
            }
            other => {
                return Err(ListError::malformed(format!(
                    "record {} has media type {}",
                    content_id, other
                )))
            }
        };
        // An unreadable timestamp is advisory data, not a reason to drop the item.
        let added_at = parse_added_at(&record.added_at);

        Ok(Self {
            content_id,
            content_kind,
            added_at,
        })
    }
}

/// Request body shared by the add and delete endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRequest {
    pub tmdb_id: String,
    pub media_type: ContentKind,
}

impl From<ItemKey> for FavoriteRequest {
    fn from(key: ItemKey) -> Self {
        Self {
            tmdb_id: key.id.to_string(),
            media_type: key.kind,
        }
    }
}
