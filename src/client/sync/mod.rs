//! # Saved List Sync
//!
//! Keeps the signed-in user's saved items cached locally and consistent with
//! the list backend.
//!
//! ## Architecture
//!
//! - **Engine**: authoritative membership cache with optimistic mutations
//! - **Membership**: ordered, session-tagged item map and its display view
//! - **Ledger**: in-flight and recently confirmed mutations per item key,
//!   used to guard rollbacks and overlay reloads
//! - **Reactor**: turns session changes into reloads and clears
//! - **Status**: loading and error state for the UI
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flixlist::client::sync::{ListSyncEngine, SessionReactor};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(ListSyncEngine::new(store, session.clone()));
//! let _reactor = SessionReactor::spawn(Arc::clone(&engine));
//!
//! session.sign_in(identity);
//! engine.add(id, ContentKind::Movie).await?;
//! for item in &engine.projected_list() {
//!     println!("{}", item.key());
//! }
//! ```

pub mod engine;
pub mod membership;
pub mod optimistic;
pub mod reactor;
pub mod status;

pub use engine::{AddOutcome, ListSyncEngine, ReloadOutcome, RemoveOutcome, ToggleOutcome};
pub use membership::{MembershipSet, ProjectedList};
pub use optimistic::{MutationKind, PendingLedger, PendingMutation};
pub use reactor::SessionReactor;
pub use status::SyncStatus;
