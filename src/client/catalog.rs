//! Catalog ingestion boundary.
//!
//! Catalog responses mix movies and series and do not always say which is
//! which. [`CatalogEntry::content_kind`] decides once, so everything past
//! this point carries an explicit [`ContentKind`].

use crate::shared::content::{ContentId, ContentKind};
use crate::shared::error::ListError;
use serde::{Deserialize, Serialize};

/// Loosely-typed item from a catalog search, browse or detail response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

impl CatalogEntry {
    /// Resolve movie vs series.
    ///
    /// An explicit `media_type` wins, then `first_air_date`, then a `name`
    /// without a `title`. Anything else is a movie.
    pub fn content_kind(&self) -> ContentKind {
        if let Some(kind) = self
            .media_type
            .as_deref()
            .and_then(|raw| raw.parse::<ContentKind>().ok())
        {
            return kind;
        }
        if present(&self.first_air_date) {
            return ContentKind::Series;
        }
        if present(&self.name) && !present(&self.title) {
            return ContentKind::Series;
        }
        ContentKind::Movie
    }

    pub fn content_id(&self) -> Result<ContentId, ListError> {
        ContentId::from_json(&self.id)
    }

    /// The `(id, kind)` pair the sync engine takes
    pub fn list_key(&self) -> Result<(ContentId, ContentKind), ListError> {
        Ok((self.content_id()?, self.content_kind()))
    }

    /// Title for display: `title` for movies, `name` for series
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.trim().is_empty())
}
