//! In-Process Room Store
//!
//! One `watch` channel per room: the channel's value is the
//! authoritative record, `send_if_modified` is the conditional write,
//! and subscribing is handing out a receiver. Backs the local
//! split-screen variant and every test.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};

use crate::store::room::{Room, RoomId, RoomStatus};
use crate::store::{RoomStore, RoomSubscription, StoreError, UpdateFn};

/// In-process implementation of [`RoomStore`].
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<BTreeMap<RoomId, Arc<watch::Sender<Room>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender(&self, id: &str) -> Result<Arc<watch::Sender<Room>>, StoreError> {
        let rooms = self.rooms.read().await;
        rooms
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::RoomNotFound(id.to_string()))
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create(&self, id: RoomId, room: Room) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().await;
        match rooms.get(&id) {
            // Overwriting an existing id keeps its subscribers attached,
            // matching setValue semantics of a realtime database.
            Some(tx) => {
                tx.send_replace(room);
            }
            None => {
                let (tx, _rx) = watch::channel(room);
                rooms.insert(id, Arc::new(tx));
            }
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Room>, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(id).map(|tx| tx.borrow().clone()))
    }

    async fn find_waiting(&self) -> Result<Option<RoomId>, StoreError> {
        let rooms = self.rooms.read().await;
        for (id, tx) in rooms.iter() {
            let room = tx.borrow();
            if room.status == RoomStatus::Waiting && !room.is_full() {
                return Ok(Some(id.clone()));
            }
        }
        Ok(None)
    }

    async fn update(&self, id: &str, apply: UpdateFn) -> Result<Room, StoreError> {
        let tx = self.sender(id).await?;
        // send_if_modified runs the closure under the channel's internal
        // lock: concurrent updates serialize and each sees the previous
        // commit. Returning false skips the notification.
        tx.send_if_modified(|room| apply(room));
        let room = tx.borrow().clone();
        Ok(room)
    }

    async fn subscribe(&self, id: &str) -> Result<RoomSubscription, StoreError> {
        let tx = self.sender(id).await?;
        Ok(RoomSubscription::new(tx.subscribe()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn waiting_room(name: &str) -> Room {
        let mut room = Room::with_created_at(0);
        room.add_player("p".into(), name);
        room
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        store.create("r1".into(), waiting_room("Alice")).await.unwrap();

        let room = store.get("r1").await.unwrap().unwrap();
        assert_eq!(room.players["p"].name, "Alice");
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_waiting_takes_first_by_key() {
        let store = MemoryStore::new();
        store.create("b".into(), waiting_room("second")).await.unwrap();
        store.create("a".into(), waiting_room("first")).await.unwrap();

        assert_eq!(store.find_waiting().await.unwrap(), Some("a".to_string()));
    }

    #[tokio::test]
    async fn test_find_waiting_skips_active() {
        let store = MemoryStore::new();
        let mut room = waiting_room("Alice");
        room.status = RoomStatus::Active;
        store.create("a".into(), room).await.unwrap();

        assert_eq!(store.find_waiting().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_missing_room() {
        let store = MemoryStore::new();
        let err = store.update("nope", Box::new(|_| true)).await.unwrap_err();
        assert!(matches!(err, StoreError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_notifies_subscribers() {
        let store = MemoryStore::new();
        store.create("r".into(), waiting_room("Alice")).await.unwrap();

        let mut sub = store.subscribe("r").await.unwrap();
        assert_eq!(sub.current().players["p"].name, "Alice");

        store
            .update(
                "r",
                Box::new(|room| {
                    room.add_player("q".into(), "Bob");
                    true
                }),
            )
            .await
            .unwrap();

        let room = sub.changed().await.unwrap();
        assert!(room.is_full());
    }

    #[tokio::test]
    async fn test_unchanged_update_is_silent() {
        let store = MemoryStore::new();
        store.create("r".into(), waiting_room("Alice")).await.unwrap();

        let mut sub = store.subscribe("r").await.unwrap();
        sub.current();

        store.update("r", Box::new(|_| false)).await.unwrap();
        store
            .update(
                "r",
                Box::new(|room| {
                    room.status = RoomStatus::Active;
                    true
                }),
            )
            .await
            .unwrap();

        // The declined update produced no notification; the next
        // snapshot observed is the real change.
        let room = sub.changed().await.unwrap();
        assert_eq!(room.status, RoomStatus::Active);
    }

    #[tokio::test]
    async fn test_concurrent_updates_serialize() {
        let store = Arc::new(MemoryStore::new());
        let mut room = waiting_room("Alice");
        room.status = RoomStatus::Active;
        store.create("r".into(), room).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..100 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update(
                        "r",
                        Box::new(|room| {
                            room.players.get_mut("p").unwrap().score += 1;
                            true
                        }),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let room = store.get("r").await.unwrap().unwrap();
        assert_eq!(room.players["p"].score, 100);
    }
}
