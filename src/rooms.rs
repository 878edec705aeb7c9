//! Per-game broadcast rooms.
//!
//! Every connection joined to a game receives the serialized events fanned
//! out after each accepted save.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::game::GameId;

const ROOM_CAPACITY: usize = 32;

/// Registry of broadcast channels, one per game id.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<GameId, broadcast::Sender<String>>>>,
}

impl RoomRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a game's room, creating it on first join.
    #[instrument(skip(self))]
    pub fn join(&self, id: &str) -> broadcast::Receiver<String> {
        let mut rooms = self.rooms.lock().expect("room lock poisoned");
        let sender = rooms
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0);
        debug!(game_id = id, subscribers = sender.receiver_count() + 1, "joined room");
        sender.subscribe()
    }

    /// Sends a serialized event to every subscriber of a game's room.
    /// Returns how many subscribers were reached; an empty room is dropped.
    pub fn publish(&self, id: &str, message: String) -> usize {
        let mut rooms = self.rooms.lock().expect("room lock poisoned");
        let Some(sender) = rooms.get(id) else {
            return 0;
        };
        match sender.send(message) {
            Ok(reached) => reached,
            Err(_) => {
                // Every subscriber is gone.
                rooms.remove(id);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let rooms = RoomRegistry::new();
        let mut first = rooms.join("g");
        let mut second = rooms.join("g");

        assert_eq!(rooms.publish("g", "hello".into()), 2);
        assert_eq!(first.recv().await.unwrap(), "hello");
        assert_eq!(second.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn rooms_are_independent() {
        let rooms = RoomRegistry::new();
        let mut a = rooms.join("a");
        let _b = rooms.join("b");

        rooms.publish("b", "for-b".into());
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn publishing_to_an_empty_room_reaches_nobody() {
        let rooms = RoomRegistry::new();
        assert_eq!(rooms.publish("ghost", "hello".into()), 0);
    }
}
