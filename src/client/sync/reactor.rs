//! # Session Reactor
//!
//! Background task that turns session transitions into engine reloads and
//! clears.
//!
//! - **Sign-in / switch**: spawns a reload; observation continues while it runs
//! - **Sign-out**: clears the engine synchronously, no network call
//! - **Token or profile refresh**: ignored
//!
//! Overlapping reloads are allowed; the engine discards any result that a
//! newer reload or clear has superseded.

use crate::client::session::{SessionIdentity, SessionTransition};
use crate::client::sync::engine::{ListSyncEngine, ReloadOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

/// Handle to the running observer. Dropping it stops the observer and any
/// reload it spawned.
#[derive(Debug)]
pub struct SessionReactor {
    task: Option<JoinHandle<()>>,
}

impl SessionReactor {
    /// Start observing `engine`'s session. Reloads immediately if a session
    /// is already present.
    pub fn spawn(engine: Arc<ListSyncEngine>) -> Self {
        let rx = engine.session().subscribe();
        let task = tokio::spawn(async move {
            Self::observe(engine, rx).await;
        });
        Self { task: Some(task) }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop observing. Reloads already started are aborted as well.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("session reactor stopped");
        }
    }

    async fn observe(
        engine: Arc<ListSyncEngine>,
        mut rx: watch::Receiver<Option<SessionIdentity>>,
    ) {
        let mut reloads = JoinSet::new();
        let mut previous = rx.borrow_and_update().clone();
        if previous.is_some() {
            Self::spawn_reload(&mut reloads, &engine);
        }

        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = rx.borrow_and_update().clone();
                    let transition = SessionTransition::between(previous.as_ref(), next.as_ref());
                    Self::react(transition, &mut reloads, &engine);
                    previous = next;
                }
                Some(finished) = reloads.join_next(), if !reloads.is_empty() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            tracing::error!(error = %e, "reload task panicked");
                        }
                    }
                }
            }
        }

        tracing::debug!("session channel closed, reactor exiting");
    }

    fn react(
        transition: SessionTransition,
        reloads: &mut JoinSet<()>,
        engine: &Arc<ListSyncEngine>,
    ) {
        match transition {
            SessionTransition::SignedOut => {
                tracing::debug!("signed out, clearing saved list");
                engine.clear();
            }
            // The previous sign-in's set is already hidden by its owner tag.
            // Mutations the new sign-in started are kept and overlaid.
            transition if transition.requires_reload() => {
                tracing::debug!(?transition, "session changed, reloading saved list");
                Self::spawn_reload(reloads, engine);
            }
            _ => {}
        }
    }

    fn spawn_reload(reloads: &mut JoinSet<()>, engine: &Arc<ListSyncEngine>) {
        let engine = Arc::clone(engine);
        reloads.spawn(async move {
            // Failures are already logged and recorded in the engine status
            if let Ok(ReloadOutcome::Superseded) = engine.reload().await {
                tracing::debug!("reload superseded by a newer session change");
            }
        });
    }
}

impl Drop for SessionReactor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
