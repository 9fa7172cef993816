//! Session State
//!
//! Holds the signed-in identity (or none) and broadcasts every change.
//! The list engine never stores identity itself; it reads [`SessionState`]
//! and reacts to its transitions.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flixlist::client::session::{SessionIdentity, SessionState, UserInfo};
//!
//! let session = SessionState::new();
//! let _changes = session.subscribe();
//!
//! session.sign_in(SessionIdentity::new(UserInfo::new("u-1", "Ada"), "token"));
//! assert!(session.is_authenticated());
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(alias = "userId")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "avatarUrl", alias = "avatar")]
    pub avatar_url: Option<String>,
}

impl UserInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            avatar_url: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// An authenticated session: who the user is plus the bearer token.
///
/// Every [`SessionState::sign_in`] stamps a fresh session id, so signing out
/// and back in as the same user is still a distinct session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user: UserInfo,
    pub token: String,
    session_id: u64,
}

impl SessionIdentity {
    pub fn new(user: UserInfo, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
            session_id: 0,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Whether both values describe the same sign-in
    pub fn same_session(&self, other: &SessionIdentity) -> bool {
        self.session_id == other.session_id && self.same_user(other)
    }

    /// Whether both identities belong to the same user
    pub fn same_user(&self, other: &SessionIdentity) -> bool {
        self.user.id == other.user.id
    }
}

// Keeps the bearer token out of logs.
impl std::fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("user", &self.user)
            .field("session_id", &self.session_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Kind of change between two consecutive session values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    /// Anonymous to signed in
    SignedIn,
    /// A new sign-in replaced the previous one (usually a different user)
    Switched,
    /// Signed in to anonymous
    SignedOut,
    /// Same sign-in (profile or token refresh) or still anonymous
    Unchanged,
}

impl SessionTransition {
    pub fn between(prev: Option<&SessionIdentity>, next: Option<&SessionIdentity>) -> Self {
        match (prev, next) {
            (None, Some(_)) => Self::SignedIn,
            (Some(_), None) => Self::SignedOut,
            (Some(a), Some(b)) if !a.same_session(b) => Self::Switched,
            _ => Self::Unchanged,
        }
    }

    /// Whether the saved list must be fetched again
    pub fn requires_reload(self) -> bool {
        matches!(self, Self::SignedIn | Self::Switched)
    }
}

/// Current session plus a causally ordered change stream.
///
/// Cloning is cheap; clones share the same underlying channel.
#[derive(Debug, Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<Option<SessionIdentity>>>,
    next_session_id: Arc<AtomicU64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Create an anonymous session
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            next_session_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a session that starts signed in
    pub fn signed_in(identity: SessionIdentity) -> Self {
        let session = Self::new();
        session.sign_in(identity);
        session
    }

    /// Snapshot of the current identity
    pub fn current(&self) -> Option<SessionIdentity> {
        self.tx.borrow().clone()
    }

    /// Session id of the current sign-in, if any
    pub fn current_session_id(&self) -> Option<u64> {
        self.tx.borrow().as_ref().map(SessionIdentity::session_id)
    }

    /// Whether `identity` is still the active sign-in
    pub fn is_current(&self, identity: &SessionIdentity) -> bool {
        self.tx
            .borrow()
            .as_ref()
            .is_some_and(|current| current.same_session(identity))
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn sign_in(&self, mut identity: SessionIdentity) {
        identity.session_id = self.next_session_id.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(user = %identity.user.id, session = identity.session_id, "session signed in");
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::info!("session signed out");
        }
    }

    /// Replace the profile of the signed-in user. Ignored when anonymous or
    /// when the profile belongs to a different user id.
    pub fn update_user(&self, user: UserInfo) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(identity) if identity.user.id == user.id && identity.user != user => {
                identity.user = user;
                true
            }
            _ => false,
        })
    }

    /// Swap the bearer token of the current sign-in (token refresh)
    pub fn refresh_token(&self, token: impl Into<String>) -> bool {
        let token = token.into();
        self.tx.send_if_modified(|current| match current {
            Some(identity) if identity.token != token => {
                identity.token = token;
                true
            }
            _ => false,
        })
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionIdentity>> {
        self.tx.subscribe()
    }
}
