//! Client runtime: configuration, session state, the list backend client and
//! the saved-list sync engine.

pub mod catalog;
pub mod config;
pub mod list_api;
#[cfg(feature = "logging")]
pub mod logging;
pub mod session;
pub mod sync;

pub use catalog::CatalogEntry;
pub use config::Config;
pub use list_api::{HttpListStore, ListStore};
pub use session::{SessionIdentity, SessionState, SessionTransition, UserInfo};
pub use sync::{
    AddOutcome, ListSyncEngine, ReloadOutcome, RemoveOutcome, SessionReactor, SyncStatus,
    ToggleOutcome,
};
