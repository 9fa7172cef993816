//! Flixlist - Saved List Client Library
//!
//! Client-side data layer for a media-browsing app: keeps the signed-in
//! user's "My List" cached locally and consistent with the list backend.
//!
//! # Overview
//!
//! - Optimistic add/remove with rollback when the backend rejects a change
//! - Atomic, superseding reloads on every sign-in or account switch
//! - Synchronous clear on sign-out
//! - Catalog ingestion that resolves movie vs series exactly once
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic types
//!   - Content ids, kinds, item keys and wire records
//!   - Error types
//!   - File and environment configuration
//!
//! - **`client`** - Runtime pieces
//!   - Session state and change notifications
//!   - HTTP client for the list backend
//!   - Sync engine and session reactor
//!
//! # Feature Flags
//!
//! - **`logging`** (default) - `client::logging::init_tracing` via `tracing-subscriber`
//!
//! # Usage
//!
//! ```rust,no_run
//! use flixlist::client::{Config, HttpListStore, ListSyncEngine, SessionReactor, SessionState};
//! use flixlist::shared::{ContentId, ContentKind};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let store = Arc::new(HttpListStore::new(config)?);
//! let session = SessionState::new();
//!
//! let engine = Arc::new(ListSyncEngine::new(store, session.clone()));
//! let _reactor = SessionReactor::spawn(Arc::clone(&engine));
//!
//! let outcome = engine.add(ContentId::new(550), ContentKind::Movie).await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The engine is `Send + Sync` and meant to be shared as `Arc<ListSyncEngine>`.
//! Internal locks are `parking_lot` and are never held across an `.await`.
//!
//! # Error Handling
//!
//! - `shared::error::ListError` for engine and backend failures
//! - `shared::config::ConfigError` for configuration

/// Shared types and data structures
pub mod shared;

/// Session, backend client and sync engine
pub mod client;
