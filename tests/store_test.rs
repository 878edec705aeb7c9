//! Tests for the versioned store's optimistic-concurrency protocol.

use std::sync::Arc;
use std::time::Duration;

use neutron_games::{Difficulty, GameState, GameStore, MemoryStore, StoreError};

fn persisted(id: &str, version: i64) -> GameState {
    let mut state = GameState::new(id.to_string());
    state.set_version(version);
    state
}

#[tokio::test]
async fn missing_key_accepts_only_version_zero() {
    let store = MemoryStore::default();

    let premature = persisted("g", 3);
    assert!(matches!(
        store.save(&premature).await,
        Err(StoreError::FirstVersion { got: 3, .. })
    ));
    assert!(store.load("g").await.unwrap().is_none());

    let first = persisted("g", 0);
    store.save(&first).await.unwrap();
    assert_eq!(store.load("g").await.unwrap().unwrap().version(), 0);
}

#[tokio::test]
async fn versions_must_advance_one_at_a_time() {
    let store = MemoryStore::default();
    store.save(&persisted("g", 0)).await.unwrap();
    store.save(&persisted("g", 1)).await.unwrap();

    // Skipping ahead fails.
    assert!(matches!(
        store.save(&persisted("g", 3)).await,
        Err(StoreError::VersionConflict {
            expected: 2,
            got: 3,
            ..
        })
    ));
    // Replaying an old version fails.
    assert!(matches!(
        store.save(&persisted("g", 1)).await,
        Err(StoreError::VersionConflict {
            expected: 2,
            got: 1,
            ..
        })
    ));

    store.save(&persisted("g", 2)).await.unwrap();
    assert_eq!(store.load("g").await.unwrap().unwrap().version(), 2);
}

#[tokio::test]
async fn rejected_save_leaves_the_record_untouched() {
    let store = MemoryStore::default();
    let mut original = persisted("g", 0);
    original.set_difficulty(Difficulty::Deep);
    store.save(&original).await.unwrap();

    let mut stale = persisted("g", 7);
    stale.set_difficulty(Difficulty::LearnedHard);
    assert!(store.save(&stale).await.is_err());

    let stored = store.load("g").await.unwrap().unwrap();
    assert_eq!(stored, original);
}

#[tokio::test]
async fn scenario_d_racing_saves_admit_exactly_one_winner() {
    let store = Arc::new(MemoryStore::default());
    store.save(&persisted("g", 0)).await.unwrap();

    let mut first = store.load("g").await.unwrap().unwrap();
    let mut second = store.load("g").await.unwrap().unwrap();
    first.bump_version();
    second.bump_version();

    let (a, b) = {
        let store_a = store.clone();
        let store_b = store.clone();
        tokio::join!(
            tokio::spawn(async move { store_a.save(&first).await }),
            tokio::spawn(async move { store_b.save(&second).await }),
        )
    };
    let a = a.unwrap();
    let b = b.unwrap();

    assert!(a.is_ok() != b.is_ok(), "exactly one save must win");
    assert_eq!(store.load("g").await.unwrap().unwrap().version(), 1);
}

#[tokio::test]
async fn racing_creates_admit_exactly_one_winner() {
    let store = Arc::new(MemoryStore::default());

    let (a, b) = {
        let store_a = store.clone();
        let store_b = store.clone();
        tokio::join!(
            tokio::spawn(async move { store_a.save(&persisted("g", 0)).await }),
            tokio::spawn(async move { store_b.save(&persisted("g", 0)).await }),
        )
    };
    let a = a.unwrap();
    let b = b.unwrap();

    assert!(a.is_ok() != b.is_ok(), "exactly one create must win");
}

#[tokio::test]
async fn init_if_missing_creates_once_and_then_returns_the_stored_game() {
    let store = MemoryStore::default();

    let created = store
        .init_if_missing(GameState::new("g".to_string()))
        .await
        .unwrap();
    assert_eq!(created.version(), 0);

    // A second init under the same id hands back the stored record, not
    // the new seed.
    let mut marked = store.load("g").await.unwrap().unwrap();
    marked.set_difficulty(Difficulty::Deep);
    marked.bump_version();
    store.save(&marked).await.unwrap();

    let reloaded = store
        .init_if_missing(GameState::new("g".to_string()))
        .await
        .unwrap();
    assert_eq!(reloaded.version(), 1);
    assert_eq!(reloaded.difficulty(), Difficulty::Deep);
}

#[tokio::test]
async fn remove_forgets_the_game() {
    let store = MemoryStore::default();
    store.save(&persisted("g", 0)).await.unwrap();
    store.remove("g").await.unwrap();
    assert!(store.load("g").await.unwrap().is_none());
    // Removing a missing key is not an error.
    store.remove("g").await.unwrap();
}

#[tokio::test]
async fn expired_games_are_gone_and_the_id_is_reusable() {
    let store = MemoryStore::new(Duration::from_millis(10));
    store.save(&persisted("g", 0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(store.load("g").await.unwrap().is_none());
    // The key expired, so the id starts a fresh version sequence.
    store.save(&persisted("g", 0)).await.unwrap();
}

#[tokio::test]
async fn games_are_independent() {
    let store = MemoryStore::default();
    store.save(&persisted("a", 0)).await.unwrap();
    store.save(&persisted("b", 0)).await.unwrap();

    let mut next_a = store.load("a").await.unwrap().unwrap();
    next_a.bump_version();
    store.save(&next_a).await.unwrap();

    assert_eq!(store.load("a").await.unwrap().unwrap().version(), 1);
    assert_eq!(store.load("b").await.unwrap().unwrap().version(), 0);
}
