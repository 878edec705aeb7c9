//! In-process store backend: a CAS-guarded map with per-record expiry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use derive_new::new;
use tracing::{debug, info, instrument, warn};

use crate::game::GameState;

use super::{GameStore, StoreError, game_key};

#[derive(new)]
struct Record {
    payload: String,
    version: i64,
    expires_at: Instant,
}

/// In-process [`GameStore`] backend.
///
/// Records are kept as serialized JSON under the same key scheme a
/// networked keyspace would use; the version precondition and the write
/// happen under one lock, which is what makes the compare-and-swap atomic.
/// Expiry is enforced lazily on access plus a periodic [`MemoryStore::sweep`].
pub struct MemoryStore {
    ttl: Duration,
    records: Mutex<HashMap<String, Record>>,
}

impl MemoryStore {
    /// Inactivity TTL applied to every record (2 hours).
    pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

    /// Store with the given record TTL.
    pub fn new(ttl: Duration) -> Self {
        MemoryStore {
            ttl,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Drops every expired record, returning how many were removed.
    #[instrument(skip(self))]
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut records = self.records.lock().expect("store lock poisoned");
        let before = records.len();
        records.retain(|_, record| record.expires_at > now);
        let removed = before - records.len();
        if removed > 0 {
            info!(removed, "expired games swept");
        }
        removed
    }

    fn decode(payload: &str) -> Result<GameState, StoreError> {
        serde_json::from_str(payload).map_err(StoreError::from)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

/// Removes the record under `key` if it has expired, then returns a live
/// reference.
fn live<'a>(records: &'a mut HashMap<String, Record>, key: &str) -> Option<&'a Record> {
    if records.get(key).is_some_and(|r| r.expires_at <= Instant::now()) {
        debug!(key, "expired record dropped on access");
        records.remove(key);
    }
    records.get(key)
}

#[async_trait]
impl GameStore for MemoryStore {
    #[instrument(skip(self))]
    async fn load(&self, id: &str) -> Result<Option<GameState>, StoreError> {
        let key = game_key(id);
        let mut records = self.records.lock().expect("store lock poisoned");
        match live(&mut records, &key) {
            Some(record) => Ok(Some(Self::decode(&record.payload)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, next), fields(game_id = %next.id(), version = next.version()))]
    async fn save(&self, next: &GameState) -> Result<(), StoreError> {
        let key = game_key(next.id());
        let payload = serde_json::to_string(next)?;

        let mut records = self.records.lock().expect("store lock poisoned");
        match live(&mut records, &key) {
            None => {
                if next.version() != 0 {
                    warn!(%key, got = next.version(), "rejected first save");
                    return Err(StoreError::FirstVersion {
                        key,
                        got: next.version(),
                    });
                }
            }
            Some(current) => {
                if current.version != next.version() - 1 {
                    warn!(
                        %key,
                        expected = current.version + 1,
                        got = next.version(),
                        "rejected stale save"
                    );
                    return Err(StoreError::VersionConflict {
                        key,
                        expected: current.version + 1,
                        got: next.version(),
                    });
                }
            }
        }

        records.insert(
            key,
            Record::new(payload, next.version(), Instant::now() + self.ttl),
        );
        debug!(version = next.version(), "state persisted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let key = game_key(id);
        let mut records = self.records.lock().expect("store lock poisoned");
        if records.remove(&key).is_some() {
            debug!(%key, "record removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted(id: &str, version: i64) -> GameState {
        let mut state = GameState::new(id.to_string());
        state.set_version(version);
        state
    }

    #[tokio::test]
    async fn rejected_save_leaves_the_stored_bytes_untouched() {
        let store = MemoryStore::default();
        store.save(&persisted("g", 0)).await.unwrap();

        let before = {
            let records = store.records.lock().unwrap();
            records.get(&game_key("g")).unwrap().payload.clone()
        };

        let mut stale = persisted("g", 5);
        stale.bump_version();
        assert!(store.save(&stale).await.is_err());

        let after = {
            let records = store.records.lock().unwrap();
            records.get(&game_key("g")).unwrap().payload.clone()
        };
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn expired_records_vanish_on_access() {
        let store = MemoryStore::new(Duration::from_millis(10));
        store.save(&persisted("g", 0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.load("g").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_reports_removals() {
        let store = MemoryStore::new(Duration::from_millis(10));
        store.save(&persisted("a", 0)).await.unwrap();
        store.save(&persisted("b", 0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.sweep(), 2);
        assert_eq!(store.sweep(), 0);
    }
}
