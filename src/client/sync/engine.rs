//! # List Synchronization Engine
//!
//! Single authoritative cache of the signed-in user's saved items.
//!
//! ## Guarantees
//!
//! - **Optimistic mutations**: `add`/`remove` change local state before the
//!   network call and roll back if the backend rejects them
//! - **Atomic reloads**: a reload swaps in a whole new set; readers never see
//!   a partially applied result
//! - **Reload supersession**: a reload result is applied only if no newer
//!   reload or clear started and its sign-in is still the active one
//! - **Fail-safe-empty**: a failed reload leaves an empty set, never a stale one
//!
//! Reads (`is_member`, `projected_list`) never wait on the network. Locks are
//! only held for synchronous transitions, never across an `.await`.

use crate::client::list_api::ListStore;
use crate::client::session::{SessionIdentity, SessionState};
use crate::client::sync::membership::{Ingested, MembershipSet, ProjectedList};
use crate::client::sync::optimistic::{MutationKind, PendingLedger};
use crate::client::sync::status::SyncStatus;
use crate::shared::content::{ContentId, ContentKind, FavoriteRecord, ItemKey, ListItem};
use crate::shared::error::ListError;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Result of a [`ListSyncEngine::reload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The fetched set was applied
    Loaded { count: usize, dropped: usize },
    /// No one is signed in; the set was cleared without a network call
    Cleared,
    /// A newer reload, clear or sign-in started first; the result was discarded
    Superseded,
}

/// Result of a successful [`ListSyncEngine::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyMember,
}

/// Result of a successful [`ListSyncEngine::remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotMember,
}

/// Result of a successful [`ListSyncEngine::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl fmt::Display for AddOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddOutcome::Added => f.write_str("Added to My List"),
            AddOutcome::AlreadyMember => f.write_str("Already in My List"),
        }
    }
}

impl fmt::Display for RemoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveOutcome::Removed => f.write_str("Removed from My List"),
            RemoveOutcome::NotMember => f.write_str("Not in My List"),
        }
    }
}

impl fmt::Display for ToggleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleOutcome::Added => AddOutcome::Added.fmt(f),
            ToggleOutcome::Removed => RemoveOutcome::Removed.fmt(f),
        }
    }
}

/// Settles one mutation's ledger entry and in-flight count, even if the
/// calling future is dropped mid-call.
struct MutationGuard<'a> {
    engine: &'a ListSyncEngine,
    key: ItemKey,
    op: Uuid,
    settled: bool,
}

impl<'a> MutationGuard<'a> {
    fn new(engine: &'a ListSyncEngine, key: ItemKey, op: Uuid) -> Self {
        engine.status.lock().in_flight_mutations += 1;
        Self {
            engine,
            key,
            op,
            settled: false,
        }
    }

    /// Returns `true` if this mutation still owns the key's local state.
    /// An accepted mutation stays in the next reload's overlay.
    fn settle(&mut self, accepted: bool) -> bool {
        self.settled = true;
        if accepted {
            let epoch = self.engine.epoch.load(Ordering::SeqCst);
            self.engine.ledger.confirm(&self.key, self.op, epoch)
        } else {
            self.engine.ledger.finish(&self.key, self.op)
        }
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.engine.ledger.finish(&self.key, self.op);
        }
        let mut status = self.engine.status.lock();
        status.in_flight_mutations = status.in_flight_mutations.saturating_sub(1);
    }
}

/// Saved-list synchronization engine.
///
/// Construct one per application session and share it as
/// `Arc<ListSyncEngine>`; consumers only use its public methods.
pub struct ListSyncEngine {
    store: Arc<dyn ListStore>,
    session: SessionState,
    membership: RwLock<Arc<MembershipSet>>,
    ledger: PendingLedger,
    /// Bumped by every reload start and every clear
    epoch: AtomicU64,
    status: Mutex<SyncStatus>,
}

impl fmt::Debug for ListSyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSyncEngine")
            .field("members", &self.membership.read().len())
            .field("pending", &self.ledger.count_pending())
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .finish()
    }
}

impl ListSyncEngine {
    /// Create an engine with an empty membership set
    pub fn new(store: Arc<dyn ListStore>, session: SessionState) -> Self {
        Self {
            store,
            membership: RwLock::new(Arc::new(MembershipSet::empty(session.current_session_id()))),
            session,
            ledger: PendingLedger::new(),
            epoch: AtomicU64::new(0),
            status: Mutex::new(SyncStatus::default()),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Snapshot of loading and error state
    pub fn status(&self) -> SyncStatus {
        self.status.lock().clone()
    }

    /// The current set, if it belongs to the active sign-in
    fn visible(&self) -> Option<Arc<MembershipSet>> {
        let current = self.membership.read().clone();
        (current.owner() == self.session.current_session_id()).then_some(current)
    }

    /// Make `slot` a set owned by `session_id` and borrow it mutably
    fn owned_set(slot: &mut Arc<MembershipSet>, session_id: u64) -> &mut MembershipSet {
        if slot.owner() != Some(session_id) {
            *slot = Arc::new(MembershipSet::empty(Some(session_id)));
        }
        Arc::make_mut(slot)
    }

    /// Whether `(id, kind)` is currently saved. Never blocks on the network.
    pub fn is_member(&self, id: ContentId, kind: ContentKind) -> bool {
        let key = ItemKey::new(kind, id);
        self.visible().is_some_and(|set| set.contains(&key))
    }

    /// Whether an add or remove for `(id, kind)` is awaiting the backend
    pub fn is_pending(&self, id: ContentId, kind: ContentKind) -> bool {
        let key = ItemKey::new(kind, id);
        self.ledger
            .get(&key)
            .is_some_and(|pending| Some(pending.session_id) == self.session.current_session_id())
    }

    /// Display view of the saved items, recomputed from the current set
    pub fn projected_list(&self) -> ProjectedList {
        let snapshot = self
            .visible()
            .unwrap_or_else(|| Arc::new(MembershipSet::empty(self.session.current_session_id())));
        ProjectedList::new(snapshot)
    }

    pub fn len(&self) -> usize {
        self.visible().map_or(0, |set| set.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every saved item and in-flight mutation without a network call.
    /// Any reload still in flight will discard its result.
    pub fn clear(&self) {
        {
            let mut membership = self.membership.write();
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *membership = Arc::new(MembershipSet::empty(self.session.current_session_id()));
        }
        self.ledger.clear_all();

        let mut status = self.status.lock();
        status.loading = false;
        status.clear_error();
        tracing::debug!("saved list cleared");
    }

    /// Replace the set with the backend's copy for the active sign-in.
    ///
    /// Anonymous callers get a cleared set and `Ok(Cleared)`. On failure the
    /// set becomes empty and the error is returned; calling again retries.
    pub async fn reload(&self) -> Result<ReloadOutcome, ListError> {
        let Some(identity) = self.session.current() else {
            self.clear();
            return Ok(ReloadOutcome::Cleared);
        };

        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.lock().loading = true;
        tracing::debug!(user = %identity.user_id(), ticket, "reloading saved list");

        let fetched = self.store.retrieve_all(&identity.token).await;
        self.apply_reload(ticket, &identity, fetched)
    }

    fn apply_reload(
        &self,
        ticket: u64,
        identity: &SessionIdentity,
        fetched: Result<Vec<FavoriteRecord>, ListError>,
    ) -> Result<ReloadOutcome, ListError> {
        let session_id = identity.session_id();
        let mut membership = self.membership.write();

        if self.epoch.load(Ordering::SeqCst) != ticket || !self.session.is_current(identity) {
            tracing::debug!(ticket, "discarding superseded reload result");
            return Ok(ReloadOutcome::Superseded);
        }

        match fetched {
            Ok(records) => {
                let Ingested { mut set, dropped } = MembershipSet::from_records(session_id, records);

                // The response may predate mutations still in flight or
                // confirmed since this reload began.
                for pending in self.ledger.overlay_for(session_id, ticket) {
                    match pending.kind {
                        MutationKind::Add => {
                            set.insert(ListItem::new(pending.key.id, pending.key.kind));
                        }
                        MutationKind::Remove => {
                            set.remove(&pending.key);
                        }
                    }
                }

                let count = set.len();
                *membership = Arc::new(set);
                drop(membership);
                self.ledger.prune_confirmed(ticket);

                let mut status = self.status.lock();
                status.loading = false;
                status.clear_error();
                status.last_synced_at = Some(chrono::Utc::now());
                tracing::info!(count, dropped, "saved list reloaded");
                Ok(ReloadOutcome::Loaded { count, dropped })
            }
            Err(e) => {
                *membership = Arc::new(MembershipSet::empty(Some(session_id)));
                drop(membership);

                let mut status = self.status.lock();
                status.loading = false;
                status.record_error(&e);
                tracing::warn!(error = %e, "saved list reload failed, list reset to empty");
                Err(e)
            }
        }
    }

    /// Save `(id, kind)` for the signed-in user.
    ///
    /// The item is visible to readers before the backend is called. If the
    /// backend rejects it, the item is removed again and the error returned.
    pub async fn add(&self, id: ContentId, kind: ContentKind) -> Result<AddOutcome, ListError> {
        let identity = self.session.current().ok_or(ListError::Unauthenticated)?;
        let session_id = identity.session_id();
        let key = ItemKey::new(kind, id);

        let op = {
            let mut membership = self.membership.write();
            let set = Self::owned_set(&mut *membership, session_id);
            if !set.insert(ListItem::new(id, kind)) {
                tracing::debug!(key = %key, "already in saved list");
                return Ok(AddOutcome::AlreadyMember);
            }
            self.ledger.begin(key, MutationKind::Add, session_id)
        };
        let mut guard = MutationGuard::new(self, key, op);

        let result = self.store.add(&identity.token, key).await;
        let owns_key = guard.settle(result.is_ok());

        match result {
            Ok(echoed) => {
                if let Some(item) = echoed {
                    let mut membership = self.membership.write();
                    if membership.owner() == Some(session_id) {
                        Arc::make_mut(&mut *membership).refresh(item);
                    }
                }
                tracing::info!(key = %key, "added to saved list");
                Ok(AddOutcome::Added)
            }
            Err(e) => {
                if owns_key {
                    let mut membership = self.membership.write();
                    if membership.owner() == Some(session_id) {
                        Arc::make_mut(&mut *membership).remove(&key);
                    }
                    tracing::warn!(key = %key, error = %e, "add rejected, rolled back");
                } else {
                    tracing::debug!(key = %key, error = %e, "add rejected after a newer mutation, no rollback");
                }
                self.status.lock().record_error(&e);
                Err(e)
            }
        }
    }

    /// Remove `(id, kind)` for the signed-in user.
    ///
    /// The item disappears before the backend is called. If the backend
    /// rejects the delete, the item is restored and the error returned.
    pub async fn remove(&self, id: ContentId, kind: ContentKind) -> Result<RemoveOutcome, ListError> {
        let identity = self.session.current().ok_or(ListError::Unauthenticated)?;
        let session_id = identity.session_id();
        let key = ItemKey::new(kind, id);

        let (op, index, snapshot) = {
            let mut membership = self.membership.write();
            let set = Self::owned_set(&mut *membership, session_id);
            let Some((index, item)) = set.remove(&key) else {
                tracing::debug!(key = %key, "not in saved list");
                return Ok(RemoveOutcome::NotMember);
            };
            (self.ledger.begin(key, MutationKind::Remove, session_id), index, item)
        };
        let mut guard = MutationGuard::new(self, key, op);

        let result = self.store.remove(&identity.token, key).await;
        let owns_key = guard.settle(result.is_ok());

        match result {
            Ok(()) => {
                tracing::info!(key = %key, "removed from saved list");
                Ok(RemoveOutcome::Removed)
            }
            Err(e) => {
                if owns_key {
                    let mut membership = self.membership.write();
                    if membership.owner() == Some(session_id) {
                        Arc::make_mut(&mut *membership).restore(index, snapshot);
                    }
                    tracing::warn!(key = %key, error = %e, "remove rejected, rolled back");
                } else {
                    tracing::debug!(key = %key, error = %e, "remove rejected after a newer mutation, no rollback");
                }
                self.status.lock().record_error(&e);
                Err(e)
            }
        }
    }

    /// Add when absent, remove when present
    pub async fn toggle(&self, id: ContentId, kind: ContentKind) -> Result<ToggleOutcome, ListError> {
        if self.is_member(id, kind) {
            self.remove(id, kind).await.map(|_| ToggleOutcome::Removed)
        } else {
            self.add(id, kind).await.map(|_| ToggleOutcome::Added)
        }
    }
}
