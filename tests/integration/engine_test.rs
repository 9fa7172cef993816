//! Engine tests against the in-memory backend

use crate::common::*;
use flixlist::client::sync::{AddOutcome, ListSyncEngine, ReloadOutcome, RemoveOutcome};
use flixlist::client::SessionState;
use flixlist::shared::{ContentId, ContentKind, ListError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const MOVIE: ContentKind = ContentKind::Movie;
const SERIES: ContentKind = ContentKind::Series;

fn id(n: u64) -> ContentId {
    ContentId::new(n)
}

fn engine_with(store: &Arc<InMemoryStore>, session: &SessionState) -> Arc<ListSyncEngine> {
    Arc::new(ListSyncEngine::new(store.clone(), session.clone()))
}

fn projected_keys(engine: &ListSyncEngine) -> Vec<String> {
    engine
        .projected_list()
        .keys()
        .map(|key| key.to_string())
        .collect()
}

#[tokio::test]
async fn test_add_twice_calls_backend_once() {
    let store = InMemoryStore::new();
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);

    assert_eq!(assert_ok!(engine.add(id(42), MOVIE).await), AddOutcome::Added);
    assert_eq!(assert_ok!(engine.add(id(42), MOVIE).await), AddOutcome::AlreadyMember);

    assert_eq!(store.started(Op::Add), 1);
    assert_eq!(engine.len(), 1);
    assert_eq!(store.remote_keys(ALICE_TOKEN), vec!["movie-42"]);
}

#[tokio::test]
async fn test_failed_add_is_visible_then_rolled_back() {
    let store = InMemoryStore::new();
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);
    let gate = store.gate(ALICE_TOKEN);
    store.fail_next(Op::Add, ListError::remote(Some(502), "Bad Gateway"));

    let task = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.add(id(42), MOVIE).await })
    };
    eventually(|| store.started(Op::Add) == 1).await;

    // Optimistic state is visible while the call is outstanding
    assert_member!(engine, 42, MOVIE);
    assert!(engine.is_pending(id(42), MOVIE));
    assert_eq!(engine.status().in_flight_mutations, 1);

    gate.release_one();
    let result = task.await.unwrap();
    assert_err!(result, ListError::RemoteUnavailable { status: Some(502), .. });

    assert_member!(engine, 42, MOVIE, not);
    assert!(!engine.is_pending(id(42), MOVIE));
    assert!(!engine.status().is_busy());
    assert_contains!(engine.status().last_error.unwrap(), "Bad Gateway");
}

#[tokio::test]
async fn test_failed_remove_restores_member() {
    let store = InMemoryStore::new();
    store.seed(ALICE_TOKEN, json!([{ "tmdb_id": 42, "media_type": "movie" }]));
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);
    assert_ok!(engine.reload().await);

    let gate = store.gate(ALICE_TOKEN);
    store.fail_next(Op::Remove, ListError::remote(None, "connection reset"));
    let task = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.remove(id(42), MOVIE).await })
    };
    eventually(|| store.started(Op::Remove) == 1).await;
    assert_member!(engine, 42, MOVIE, not);

    gate.release_one();
    assert_err!(task.await.unwrap());
    assert_member!(engine, 42, MOVIE);
}

#[tokio::test]
async fn test_unrelated_keys_mutate_concurrently() {
    let store = InMemoryStore::new();
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);

    let (a, b, c) = tokio::join!(
        engine.add(id(1), MOVIE),
        engine.add(id(2), SERIES),
        engine.add(id(1), SERIES),
    );
    assert_ok!(a);
    assert_ok!(b);
    assert_ok!(c);
    assert_eq!(engine.len(), 3);
    assert_eq!(store.started(Op::Add), 3);
}

#[tokio::test]
async fn test_kind_is_part_of_the_key() {
    let store = InMemoryStore::new();
    let engine = engine_with(&store, &signed_in_as(alice()));

    assert_ok!(engine.add(id(100), SERIES).await);
    assert_ok!(engine.add(id(100), MOVIE).await);
    assert_ok!(engine.add(id(100), MOVIE).await);

    assert_eq!(projected_keys(&engine), vec!["tv-100", "movie-100"]);
}

#[tokio::test]
async fn test_reload_supersession_keeps_newest_identity() {
    let store = InMemoryStore::new();
    store.seed(ALICE_TOKEN, json!([{ "tmdb_id": 1, "media_type": "movie" }]));
    store.seed(BOB_TOKEN, json!([{ "tmdb_id": 2, "media_type": "tv" }]));
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);

    let alice_gate = store.gate(ALICE_TOKEN);
    let stale = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.reload().await })
    };
    eventually(|| store.started(Op::Retrieve) == 1).await;

    // Fast logout/login while Alice's fetch is outstanding
    session.sign_out();
    session.sign_in(bob());
    assert_eq!(
        assert_ok!(engine.reload().await),
        ReloadOutcome::Loaded { count: 1, dropped: 0 }
    );

    alice_gate.release_one();
    assert_eq!(assert_ok!(stale.await.unwrap()), ReloadOutcome::Superseded);

    assert_eq!(projected_keys(&engine), vec!["tv-2"]);
    assert_member!(engine, 1, MOVIE, not);
}

#[tokio::test]
async fn test_reload_discarded_after_clear() {
    let store = InMemoryStore::new();
    store.seed(ALICE_TOKEN, json!([{ "tmdb_id": 1, "media_type": "movie" }]));
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);

    let gate = store.gate(ALICE_TOKEN);
    let pending = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.reload().await })
    };
    eventually(|| store.started(Op::Retrieve) == 1).await;
    assert!(engine.status().loading);

    session.sign_out();
    engine.clear();
    gate.release_one();

    assert_eq!(assert_ok!(pending.await.unwrap()), ReloadOutcome::Superseded);
    assert!(engine.is_empty());
    assert!(!engine.status().loading);
}

#[tokio::test]
async fn test_clear_on_logout_is_synchronous() {
    let store = InMemoryStore::new();
    store.seed(
        ALICE_TOKEN,
        json!([
            { "tmdb_id": 1, "media_type": "movie" },
            { "tmdb_id": 2, "media_type": "tv" }
        ]),
    );
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);
    assert_ok!(engine.reload().await);
    assert_eq!(engine.projected_list().len(), 2);

    let retrieves = store.started(Op::Retrieve);
    session.sign_out();

    assert_eq!(engine.projected_list().len(), 0);
    assert_eq!(store.started(Op::Retrieve), retrieves);
}

#[tokio::test]
async fn test_auth_rejection_is_a_reload_failure() {
    let store = InMemoryStore::new();
    store.seed(ALICE_TOKEN, json!([{ "tmdb_id": 1, "media_type": "movie" }]));
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);
    assert_ok!(engine.reload().await);

    store.fail_next(Op::Retrieve, ListError::remote(Some(401), "token expired"));
    let err = engine.reload().await.unwrap_err();
    assert!(err.is_auth_rejected());
    assert!(engine.is_empty());

    // A retry recovers
    assert_ok!(engine.reload().await);
    assert_eq!(engine.len(), 1);
}

#[tokio::test]
async fn test_malformed_records_are_dropped_not_fatal() {
    let store = InMemoryStore::new();
    store.seed(
        ALICE_TOKEN,
        json!([
            { "tmdb_id": "not-a-number", "media_type": "movie" },
            { "tmdb_id": 3, "media_type": "documentary" },
            { "tmdb_id": 4, "media_type": "movie" }
        ]),
    );
    let engine = engine_with(&store, &signed_in_as(alice()));

    assert_eq!(
        assert_ok!(engine.reload().await),
        ReloadOutcome::Loaded { count: 1, dropped: 2 }
    );
    assert_eq!(projected_keys(&engine), vec!["movie-4"]);
}

#[tokio::test]
async fn test_rapid_toggle_failed_add_does_not_undo_newer_remove() {
    let store = InMemoryStore::new();
    let engine = engine_with(&store, &signed_in_as(alice()));
    let gate = store.gate(ALICE_TOKEN);
    store.fail_next(Op::Add, ListError::remote(Some(500), "boom"));

    let add = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.add(id(42), MOVIE).await })
    };
    eventually(|| store.started(Op::Add) == 1).await;
    let remove = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.remove(id(42), MOVIE).await })
    };
    eventually(|| store.started(Op::Remove) == 1).await;
    assert_member!(engine, 42, MOVIE, not);
    assert!(engine.is_pending(id(42), MOVIE));

    gate.release(2);
    assert_err!(add.await.unwrap());
    assert_eq!(assert_ok!(remove.await.unwrap()), RemoveOutcome::Removed);

    // The stale add rollback must not resurrect or double-remove anything
    assert_member!(engine, 42, MOVIE, not);
    assert!(!engine.is_pending(id(42), MOVIE));
    assert!(store.remote_keys(ALICE_TOKEN).is_empty());
}

#[tokio::test]
async fn test_reload_keeps_in_flight_add() {
    let store = InMemoryStore::new();
    store.seed(ALICE_TOKEN, json!([{ "tmdb_id": 1, "media_type": "movie" }]));
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);

    let gate = store.gate(ALICE_TOKEN);
    let add = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.add(id(9), SERIES).await })
    };
    eventually(|| store.started(Op::Add) == 1).await;

    let reload = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.reload().await })
    };
    eventually(|| store.started(Op::Retrieve) == 1).await;

    // Whichever call lands first, the add survives the reload
    gate.release(2);
    assert_ok!(add.await.unwrap());
    assert_ok!(reload.await.unwrap());

    assert_member!(engine, 1, MOVIE);
    assert_member!(engine, 9, SERIES);
}

#[tokio::test]
async fn test_reload_keeps_add_confirmed_after_list_was_read() {
    let store = InMemoryStore::new();
    store.seed(ALICE_TOKEN, json!([{ "tmdb_id": 1, "media_type": "movie" }]));
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);
    let hold = store.hold_retrieve_responses();

    let reload = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.reload().await })
    };
    eventually(|| store.started(Op::Retrieve) == 1).await;

    // Confirmed while the older snapshot is still on its way back
    assert_eq!(assert_ok!(engine.add(id(9), SERIES).await), AddOutcome::Added);
    assert!(!engine.is_pending(id(9), SERIES));

    hold.release_one();
    assert_eq!(
        assert_ok!(reload.await.unwrap()),
        ReloadOutcome::Loaded { count: 2, dropped: 0 }
    );
    assert_member!(engine, 9, SERIES);

    // A later reload reads the confirmed add from the backend itself
    hold.release_one();
    assert_ok!(engine.reload().await);
    assert_eq!(projected_keys(&engine), vec!["movie-1", "tv-9"]);
}

#[tokio::test]
async fn test_reload_keeps_remove_confirmed_after_list_was_read() {
    let store = InMemoryStore::new();
    store.seed(
        ALICE_TOKEN,
        json!([
            { "tmdb_id": 1, "media_type": "movie" },
            { "tmdb_id": 2, "media_type": "movie" }
        ]),
    );
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);
    assert_ok!(engine.reload().await);
    let hold = store.hold_retrieve_responses();

    let reload = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.reload().await })
    };
    eventually(|| store.started(Op::Retrieve) == 2).await;

    assert_eq!(assert_ok!(engine.remove(id(1), MOVIE).await), RemoveOutcome::Removed);

    hold.release_one();
    assert_ok!(reload.await.unwrap());
    assert_member!(engine, 1, MOVIE, not);
    assert_eq!(projected_keys(&engine), vec!["movie-2"]);
}

#[tokio::test]
async fn test_account_switch_hides_previous_list() {
    let store = InMemoryStore::new();
    store.seed(ALICE_TOKEN, json!([{ "tmdb_id": 1, "media_type": "movie" }]));
    let session = signed_in_as(alice());
    let engine = engine_with(&store, &session);
    assert_ok!(engine.reload().await);

    session.sign_in(bob());
    assert!(engine.is_empty());

    // Bob's first mutation starts from an empty set of his own
    assert_ok!(engine.add(id(5), MOVIE).await);
    assert_eq!(projected_keys(&engine), vec!["movie-5"]);
    assert_eq!(store.remote_keys(BOB_TOKEN), vec!["movie-5"]);
    assert_eq!(store.remote_keys(ALICE_TOKEN), vec!["movie-1"]);
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let store = InMemoryStore::new();
    store.seed(ALICE_TOKEN, json!([{ "tmdb_id": 7, "media_type": "tv" }]));
    let session = SessionState::new();
    let engine = engine_with(&store, &session);

    assert_err!(engine.add(id(5), MOVIE).await, ListError::Unauthenticated);
    assert_member!(engine, 5, MOVIE, not);

    session.sign_in(alice());
    assert_ok!(engine.reload().await);
    assert_member!(engine, 7, SERIES);
    assert_member!(engine, 5, MOVIE, not);

    assert_eq!(assert_ok!(engine.add(id(5), MOVIE).await), AddOutcome::Added);
    assert_eq!(engine.projected_list().len(), 2);

    assert_eq!(assert_ok!(engine.remove(id(7), SERIES).await), RemoveOutcome::Removed);
    let remaining = engine.projected_list().to_vec();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].content_id, id(5));
    assert_eq!(remaining[0].content_kind, MOVIE);
    // Metadata echoed by the backend refreshed the optimistic entry
    assert!(remaining[0].added_at.is_some());
}
