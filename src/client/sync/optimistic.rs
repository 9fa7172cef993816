//! # Optimistic Mutation Ledger
//!
//! Tracks the add/remove mutations that have been applied locally but not yet
//! confirmed by the list backend.
//!
//! ## Features
//!
//! - **Per-key tracking**: at most one "newest" mutation per item key
//! - **Operation ids**: every mutation gets a fresh `Uuid`
//! - **Guarded rollback**: a failing mutation may only undo its local change
//!   while it is still the newest mutation for its key
//! - **Confirmations**: a confirmed mutation is remembered with the reload
//!   epoch it landed in, so a reload whose response may predate it still
//!   re-applies it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flixlist::client::sync::optimistic::{MutationKind, PendingLedger};
//!
//! let ledger = PendingLedger::new();
//! let op = ledger.begin(key, MutationKind::Add, session_id);
//! // ... remote call fails ...
//! if ledger.finish(&key, op) {
//!     // still the newest mutation: safe to roll back
//! }
//! ```

use crate::shared::content::ItemKey;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Direction of an optimistic mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Remove,
}

/// One in-flight mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    pub id: Uuid,
    pub key: ItemKey,
    pub kind: MutationKind,
    /// Sign-in the mutation was issued under
    pub session_id: u64,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LedgerState {
    pending: HashMap<ItemKey, PendingMutation>,
    /// Newest confirmed mutation per key, with the epoch it was confirmed in
    confirmed: HashMap<ItemKey, (PendingMutation, u64)>,
}

/// In-flight and recently confirmed mutations keyed by item key
#[derive(Debug, Default)]
pub struct PendingLedger {
    state: Mutex<LedgerState>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new mutation for `key`, superseding any older one
    pub fn begin(&self, key: ItemKey, kind: MutationKind, session_id: u64) -> Uuid {
        let id = Uuid::new_v4();
        let mutation = PendingMutation {
            id,
            key,
            kind,
            session_id,
            started_at: Utc::now(),
        };

        if let Some(previous) = self.state.lock().pending.insert(key, mutation) {
            tracing::debug!(
                key = %key,
                superseded = %previous.id,
                "mutation superseded by a newer one for the same key"
            );
        }
        id
    }

    /// Settle mutation `id`. Returns `true` if it was still the newest
    /// mutation for `key`, i.e. it still owns the key's local state.
    pub fn finish(&self, key: &ItemKey, id: Uuid) -> bool {
        let mut state = self.state.lock();
        match state.pending.get(key) {
            Some(current) if current.id == id => {
                state.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Settle mutation `id` as accepted by the backend during reload epoch
    /// `epoch`. Same return value as [`finish`](Self::finish).
    pub fn confirm(&self, key: &ItemKey, id: Uuid, epoch: u64) -> bool {
        let mut state = self.state.lock();
        match state.pending.get(key) {
            Some(current) if current.id == id => {
                if let Some(mutation) = state.pending.remove(key) {
                    state.confirmed.insert(*key, (mutation, epoch));
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self, key: &ItemKey) -> bool {
        self.state.lock().pending.contains_key(key)
    }

    pub fn get(&self, key: &ItemKey) -> Option<PendingMutation> {
        self.state.lock().pending.get(key).cloned()
    }

    /// Mutations of `session_id` a reload with `ticket` must re-apply, oldest
    /// first: those confirmed at or after `ticket`, then those still in flight.
    pub fn overlay_for(&self, session_id: u64, ticket: u64) -> Vec<PendingMutation> {
        let state = self.state.lock();
        let mut confirmed: Vec<&PendingMutation> = state
            .confirmed
            .values()
            .filter(|(mutation, epoch)| mutation.session_id == session_id && *epoch >= ticket)
            .map(|(mutation, _)| mutation)
            .collect();
        confirmed.sort_by_key(|mutation| mutation.started_at);

        let mut pending: Vec<&PendingMutation> = state
            .pending
            .values()
            .filter(|mutation| mutation.session_id == session_id)
            .collect();
        pending.sort_by_key(|mutation| mutation.started_at);

        confirmed.into_iter().chain(pending).cloned().collect()
    }

    /// Forget confirmations older than `ticket`; a reload with that ticket
    /// was fetched after they landed.
    pub fn prune_confirmed(&self, ticket: u64) {
        self.state.lock().confirmed.retain(|_, (_, epoch)| *epoch >= ticket);
    }

    pub fn count_pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Forget every in-flight and confirmed mutation; later results will not
    /// own any local state.
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.pending.clear();
        state.confirmed.clear();
    }
}
