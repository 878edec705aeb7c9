//! Versioned persistence of game state under optimistic concurrency.
//!
//! The store is the sole source of truth for the persisted copy of each
//! game. Writers never lock a game: a save carries the version it expects
//! to land on and the store rejects anything else, leaving retry policy to
//! the caller.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use derive_more::{Display, Error, From};

use crate::game::GameState;

const KEY_PREFIX: &str = "neutron:game:";

/// Deterministic persistence key for a game id.
pub fn game_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Errors raised by the store.
#[derive(Debug, Display, Error, From)]
pub enum StoreError {
    /// A record can only be created at version 0.
    #[display("first save must start at version 0 (key={key}, got={got})")]
    #[from(skip)]
    FirstVersion {
        /// Persistence key.
        key: String,
        /// The rejected version.
        got: i64,
    },
    /// The caller was not writing exactly the next version.
    #[display("version_conflict: key={key}, expected={expected}, got={got}")]
    #[from(skip)]
    VersionConflict {
        /// Persistence key.
        key: String,
        /// The version the store would have accepted.
        expected: i64,
        /// The version the caller supplied.
        got: i64,
    },
    /// The key changed hands between read and write. Reserved for backends
    /// whose read and write are not one atomic step; the in-process store
    /// reports races through [`StoreError::VersionConflict`] instead.
    #[display("concurrent_update: key={key}, attempted_version={attempted}")]
    #[from(skip)]
    ConcurrentUpdate {
        /// Persistence key.
        key: String,
        /// The version the losing writer carried.
        attempted: i64,
    },
    /// The record could not be (de)serialized.
    #[display("unreadable record: {_0}")]
    Codec(serde_json::Error),
}

/// A keyspace holding one [`GameState`] per game id, guarded by
/// compare-and-swap on the version field.
///
/// Any backend offering an atomic "write if the stored version equals the
/// expected one" can implement this; nothing here assumes a particular
/// transactional primitive.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Loads the persisted state, if the game exists and has not expired.
    async fn load(&self, id: &str) -> Result<Option<GameState>, StoreError>;

    /// Persists `next` iff its version is exactly one past the stored one
    /// (or 0 for a brand-new key). A rejected save leaves the stored
    /// record untouched.
    async fn save(&self, next: &GameState) -> Result<(), StoreError>;

    /// Deletes the persisted record, if any.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Liveness probe for the readiness endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Returns the existing state for the seed's id, or persists the seed
    /// at version 0. The only path that may create a brand-new record.
    async fn init_if_missing(&self, mut seed: GameState) -> Result<GameState, StoreError> {
        if let Some(existing) = self.load(seed.id()).await? {
            return Ok(existing);
        }
        seed.set_version(0);
        self.save(&seed).await?;
        Ok(seed)
    }
}
