//! Room Matchmaking
//!
//! Pairs a player with the first room still waiting for an opponent,
//! or creates a fresh one. The join itself is a guarded write: the
//! queried room may fill or complete between the query and the join,
//! in which case the player falls through to creating their own room.

use tokio::sync::oneshot;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::room::{PlayerId, Room, RoomId, RoomStatus};
use crate::store::{RoomStore, StoreError};

/// Identifiers keying one client's session after matchmaking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedRoom {
    /// The room this client belongs to.
    pub room_id: RoomId,
    /// The id this client plays under.
    pub player_id: PlayerId,
}

/// Join the first waiting room, or create one.
///
/// Joining flips the room to `active` in the same write that adds the
/// player, so an observer never sees a full-but-waiting room. Store
/// failures here are the one place the presentation layer is told
/// about them.
pub async fn find_or_create_room(
    store: &dyn RoomStore,
    player_name: &str,
) -> Result<JoinedRoom, StoreError> {
    let player_id: PlayerId = Uuid::new_v4().to_string();

    if let Some(room_id) = store.find_waiting().await? {
        let (joined_tx, joined_rx) = oneshot::channel();
        let id = player_id.clone();
        let name = player_name.to_string();
        store
            .update(
                &room_id,
                Box::new(move |room| {
                    // Re-checked inside the write: the room may have
                    // filled or completed since the query.
                    let joinable = room.status == RoomStatus::Waiting && !room.is_full();
                    if joinable {
                        room.add_player(id, name);
                        room.status = RoomStatus::Active;
                    }
                    let _ = joined_tx.send(joinable);
                    joinable
                }),
            )
            .await?;

        if joined_rx.await.unwrap_or(false) {
            info!(%room_id, "joined waiting room");
            return Ok(JoinedRoom { room_id, player_id });
        }
        debug!(%room_id, "waiting room taken; creating a new one");
    }

    let room_id: RoomId = Uuid::new_v4().to_string();
    let mut room = Room::new();
    room.add_player(player_id.clone(), player_name);
    store.create(room_id.clone(), room).await?;
    info!(%room_id, "created waiting room");

    Ok(JoinedRoom { room_id, player_id })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_first_player_creates_waiting_room() {
        let store = MemoryStore::new();
        let joined = find_or_create_room(&store, "Alice").await.unwrap();

        let room = store.get(&joined.room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[&joined.player_id].name, "Alice");
        assert_eq!(room.players[&joined.player_id].score, 0);
    }

    #[tokio::test]
    async fn test_second_player_joins_and_activates() {
        let store = MemoryStore::new();
        let first = find_or_create_room(&store, "Alice").await.unwrap();
        let second = find_or_create_room(&store, "Bob").await.unwrap();

        assert_eq!(first.room_id, second.room_id);
        assert_ne!(first.player_id, second.player_id);

        let room = store.get(&first.room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Active);
        assert!(room.is_full());
    }

    #[tokio::test]
    async fn test_third_player_gets_a_fresh_room() {
        let store = MemoryStore::new();
        let first = find_or_create_room(&store, "Alice").await.unwrap();
        let _second = find_or_create_room(&store, "Bob").await.unwrap();
        let third = find_or_create_room(&store, "Cara").await.unwrap();

        assert_ne!(third.room_id, first.room_id);
        let room = store.get(&third.room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.players.len(), 1);
    }
}
