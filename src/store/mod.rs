//! Shared Room Store
//!
//! The abstract "shared state store" the synchronization layer talks
//! to. The trait deliberately mirrors what a realtime database offers
//! a client (read, conditional write, matchmaking query, change
//! subscription) without naming one. The in-process [`MemoryStore`]
//! backs the local split-screen variant and all tests; a remote backend
//! implements the same trait by bridging its native notifications into
//! a [`RoomSubscription`].
//!
//! ## Conditional writes
//!
//! [`RoomStore::update`] is the only mutation primitive. The closure
//! runs exactly once against the store's current state under its
//! internal synchronization and returns whether it changed anything;
//! returning `false` suppresses the change notification. Guarding
//! read-modify-write cycles inside the closure is what closes the
//! double-credit and duplicate-batch races.

pub mod memory;
pub mod room;

// Re-export the record types alongside the trait
pub use memory::MemoryStore;
pub use room::{
    AnswerRecord, PlayerId, PlayerRecord, QuestionRecord, Room, RoomId, RoomStatus,
};

use async_trait::async_trait;
use tokio::sync::watch;

/// A conditional room mutation.
///
/// Returns `true` if the room was changed (commit + notify) or `false`
/// to leave it untouched.
pub type UpdateFn = Box<dyn FnOnce(&mut Room) -> bool + Send>;

/// Store failures.
///
/// Only matchmaking/join surfaces these to the presentation layer;
/// mid-game failures are logged and swallowed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No room exists under this id.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The shared store a duel session synchronizes through.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Write a room record wholesale, creating or replacing it.
    /// Existing subscribers observe the replacement as a change.
    async fn create(&self, id: RoomId, room: Room) -> Result<(), StoreError>;

    /// Read a room record.
    async fn get(&self, id: &str) -> Result<Option<Room>, StoreError>;

    /// The matchmaking query: the first room (key order) still waiting
    /// for an opponent, if any.
    async fn find_waiting(&self) -> Result<Option<RoomId>, StoreError>;

    /// Apply a conditional mutation and return the room as committed.
    async fn update(&self, id: &str, apply: UpdateFn) -> Result<Room, StoreError>;

    /// Subscribe to a room's change notifications.
    async fn subscribe(&self, id: &str) -> Result<RoomSubscription, StoreError>;
}

/// A cancellable stream of room snapshots.
///
/// Notifications coalesce: a slow consumer observes the latest state,
/// not every intermediate one, which full-snapshot projection makes
/// safe. Dropping the handle unsubscribes.
pub struct RoomSubscription {
    rx: watch::Receiver<Room>,
}

impl RoomSubscription {
    /// Wrap a watch receiver as a subscription handle.
    pub fn new(rx: watch::Receiver<Room>) -> Self {
        Self { rx }
    }

    /// The current snapshot, marking it seen.
    pub fn current(&mut self) -> Room {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next unseen snapshot. Returns `None` once the room
    /// is gone from the store.
    pub async fn changed(&mut self) -> Option<Room> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
