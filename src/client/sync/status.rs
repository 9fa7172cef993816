//! # Sync Status
//!
//! Observable loading and error state of the list engine, for spinners and
//! transient error notices.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// A reload is in flight
    pub loading: bool,
    /// Number of add/remove calls awaiting the backend
    pub in_flight_mutations: usize,
    /// Most recent recoverable failure, cleared by the next success
    pub last_error: Option<String>,
    /// When the last reload was applied
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncStatus {
    pub fn is_busy(&self) -> bool {
        self.loading || self.in_flight_mutations > 0
    }

    pub(crate) fn record_error(&mut self, error: &impl std::fmt::Display) {
        self.last_error = Some(error.to_string());
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }
}
