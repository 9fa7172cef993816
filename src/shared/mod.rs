//! Shared Module
//!
//! Types shared by every part of the list client: the saved-item data model,
//! the error taxonomy and configuration. Nothing here performs I/O beyond
//! reading a config file.

/// Saved-item data model and wire records
pub mod content;

/// Error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use content::{ContentId, ContentKind, FavoriteRecord, FavoriteRequest, ItemKey, ListItem};
pub use error::ListError;
