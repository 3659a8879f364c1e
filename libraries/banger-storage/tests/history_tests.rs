//! Integration tests for the recently played history


use banger_core::{types::*, PlaylistStore};
use banger_storage::SqlitePlaylistStore;
use test_helpers::*;

#[tokio::test]
async fn test_history_is_most_recent_first() {
    let test_db = TestDb::new().await;
    let store = &test_db.store;

    for id in ["a", "b", "c"] {
        store.record_history(&create_test_track(id)).await.unwrap();
    }

    assert_eq!(ids(&store.recently_played().await.unwrap()), vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_replaying_moves_track_to_front() {
    let test_db = TestDb::new().await;
    let store = &test_db.store;

    for id in ["a", "b", "c", "a"] {
        store.record_history(&create_test_track(id)).await.unwrap();
    }

    assert_eq!(ids(&store.recently_played().await.unwrap()), vec!["a", "c", "b"]);
}

#[tokio::test]
async fn test_history_is_capped_evicting_oldest() {
    let test_db = TestDb::new().await;
    let store = &test_db.store;

    for i in 0..(HISTORY_LIMIT + 5) {
        store
            .record_history(&create_test_track(&format!("t{i}")))
            .await
            .unwrap();
    }

    let recent = store.recently_played().await.unwrap();
    assert_eq!(recent.len(), HISTORY_LIMIT);
    assert_eq!(recent[0].id.as_str(), format!("t{}", HISTORY_LIMIT + 4));
    assert_eq!(recent[HISTORY_LIMIT - 1].id.as_str(), "t5");
    assert!(!recent.iter().any(|t| t.id.as_str() == "t0"));
}

#[tokio::test]
async fn test_custom_history_limit() {
    let test_db = TestDb::new().await;
    let store = SqlitePlaylistStore::new(test_db.pool().clone()).with_history_limit(2);

    for id in ["a", "b", "c"] {
        store.record_history(&create_test_track(id)).await.unwrap();
    }

    assert_eq!(ids(&store.recently_played().await.unwrap()), vec!["c", "b"]);
}
