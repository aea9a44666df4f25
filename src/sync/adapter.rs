//! Synchronization Adapter
//!
//! Projects shared room snapshots into [`GameState`] and mirrors local
//! intents back into the store. All outbound writes run the game logic
//! inside [`RoomStore::update`] closures, so the check-then-write races
//! of a naive client (double credit, duplicate question batches) cannot
//! commit twice.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::rng::SessionRng;
use crate::game::engine::{self, SubmitOutcome};
use crate::game::question::{self, Question};
use crate::game::state::{GameState, Player};
use crate::session::profile::GameProfile;
use crate::store::room::{PlayerId, QuestionRecord, Room, RoomId, RoomStatus, ROOM_CAPACITY};
use crate::store::{RoomStore, RoomSubscription, StoreError};

// =============================================================================
// INBOUND PROJECTION
// =============================================================================

/// Rebuilds the client game state from room snapshots.
///
/// Answer options are derived locally from the stored operands and
/// cached per question index, so a question's presentation order stays
/// stable across snapshot rebuilds for as long as its operands do.
pub struct Projector {
    room_id: RoomId,
    cache: Vec<Question>,
}

impl Projector {
    /// Create a projector for one room.
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            cache: Vec::new(),
        }
    }

    /// Project a room snapshot into a [`GameState`].
    pub fn project(&mut self, rng: &mut SessionRng, room: &Room) -> GameState {
        let mut questions = Vec::with_capacity(room.questions.len());
        for index in 0..room.questions.len() {
            let record = match room.question(index) {
                Some(record) => record,
                // Question indices are contiguous; stop at a gap.
                None => break,
            };
            let cached = self
                .cache
                .get(index)
                .filter(|q| q.record() == record)
                .cloned();
            questions.push(match cached {
                Some(question) => question,
                None => question::options_for(rng, record),
            });
        }
        self.cache = questions.clone();

        let players = room
            .players
            .iter()
            .map(|(id, record)| Player {
                id: id.clone(),
                name: record.name.clone(),
                score: record.score,
            })
            .collect();

        GameState {
            room_id: self.room_id.clone(),
            players,
            questions,
            current_question_index: room.current_question_index,
            started: room.status == RoomStatus::Active,
            ended: room.status == RoomStatus::Completed,
            waiting_for_opponent: room.players.len() < ROOM_CAPACITY,
        }
    }
}

/// The inbound half of the adapter: a spawned task that consumes a
/// room subscription and publishes projected snapshots.
pub struct RoomWatcher {
    store: Arc<dyn RoomStore>,
    profile: GameProfile,
    rng: SessionRng,
    projector: Projector,
    state_tx: Arc<watch::Sender<GameState>>,
}

impl RoomWatcher {
    /// Subscribe to a room and spawn the projection loop.
    ///
    /// The subscription is established before this returns, so no
    /// change slips between the caller's last read and the first
    /// projected snapshot. Abort the returned handle to unsubscribe.
    pub async fn spawn(
        store: Arc<dyn RoomStore>,
        profile: GameProfile,
        room_id: RoomId,
        salt: &str,
        state_tx: Arc<watch::Sender<GameState>>,
    ) -> Result<JoinHandle<()>, StoreError> {
        let subscription = store.subscribe(&room_id).await?;
        let watcher = Self {
            store,
            profile,
            rng: SessionRng::for_session(&room_id, salt),
            projector: Projector::new(room_id),
            state_tx,
        };
        Ok(tokio::spawn(watcher.run(subscription)))
    }

    async fn run(mut self, mut subscription: RoomSubscription) {
        let mut room = subscription.current();
        loop {
            self.apply(&room).await;
            room = match subscription.changed().await {
                Some(room) => room,
                None => break,
            };
        }
        debug!(room = %self.projector.room_id, "room subscription closed");
    }

    async fn apply(&mut self, room: &Room) {
        let state = self.projector.project(&mut self.rng, room);
        self.state_tx.send_replace(state);

        // Question auto-generation trigger: the match is running but no
        // questions exist yet. Both clients may observe this at once;
        // the guarded write retains exactly one batch.
        if self.profile.batch_questions
            && room.status == RoomStatus::Active
            && room.questions.is_empty()
        {
            let batch = question::generate_batch(
                &mut self.rng,
                self.profile.operand_low,
                self.profile.operand_high,
                self.profile.question_count,
            );
            match ensure_questions(self.store.as_ref(), &self.projector.room_id, batch).await {
                Ok(written) => debug!(written, "question batch ensured"),
                Err(err) => warn!(%err, "question batch write failed"),
            }
        }
    }
}

// =============================================================================
// OUTBOUND WRITES
// =============================================================================

fn closure_skipped() -> StoreError {
    StoreError::Unavailable("store did not run the update".into())
}

/// Write a question batch unless the room already has one.
///
/// Returns whether this caller's batch was the one retained. Safe to
/// call from any number of racing clients.
pub async fn ensure_questions(
    store: &dyn RoomStore,
    room_id: &str,
    batch: BTreeMap<usize, QuestionRecord>,
) -> Result<bool, StoreError> {
    let (outcome_tx, outcome_rx) = oneshot::channel();
    store
        .update(
            room_id,
            Box::new(move |room| {
                let write = room.status == RoomStatus::Active && room.questions.is_empty();
                if write {
                    room.questions = batch;
                }
                let _ = outcome_tx.send(write);
                write
            }),
        )
        .await?;
    outcome_rx.await.map_err(|_| closure_skipped())
}

/// Submit an answer: run the scoring engine inside a conditional write.
///
/// The spare question for the next index is pre-generated here so the
/// closure stays free of RNG state; it is only installed when the
/// submission is accepted and no question exists yet (lazy profile).
pub async fn push_answer(
    store: &dyn RoomStore,
    profile: &GameProfile,
    rng: &mut SessionRng,
    room_id: &str,
    player_id: &PlayerId,
    question_index: usize,
    selected: i32,
) -> Result<SubmitOutcome, StoreError> {
    let spare = if profile.batch_questions {
        None
    } else {
        Some(question::generate_record(
            rng,
            profile.operand_low,
            profile.operand_high,
        ))
    };
    let now = Utc::now().timestamp_millis();
    let question_count = profile.question_count;
    let player = player_id.clone();

    let (outcome_tx, outcome_rx) = oneshot::channel();
    store
        .update(
            room_id,
            Box::new(move |room| {
                let outcome = engine::submit_answer(
                    room,
                    question_count,
                    &player,
                    question_index,
                    selected,
                    now,
                    spare,
                );
                let accepted = outcome.is_accepted();
                let _ = outcome_tx.send(outcome);
                accepted
            }),
        )
        .await?;
    outcome_rx.await.map_err(|_| closure_skipped())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::OPTION_COUNT;

    fn networked_room() -> Room {
        let mut room = Room::with_created_at(0);
        room.add_player("alice-id".into(), "Alice");
        room.add_player("bob-id".into(), "Bob");
        room.status = RoomStatus::Active;
        room
    }

    #[test]
    fn test_projection_fields() {
        let mut rng = SessionRng::new(1);
        let mut projector = Projector::new("r".into());

        let mut room = Room::with_created_at(0);
        room.add_player("alice-id".into(), "Alice");
        let state = projector.project(&mut rng, &room);

        assert_eq!(state.room_id, "r");
        assert!(state.waiting_for_opponent);
        assert!(!state.started);
        assert!(!state.ended);
        assert_eq!(state.players.len(), 1);

        room.add_player("bob-id".into(), "Bob");
        room.status = RoomStatus::Active;
        room.questions.insert(0, QuestionRecord { a: 2, b: 5 });
        let state = projector.project(&mut rng, &room);

        assert!(!state.waiting_for_opponent);
        assert!(state.started);
        assert_eq!(state.questions.len(), 1);
        assert_eq!(state.questions[0].answer(), 7);
        assert_eq!(state.questions[0].options.len(), OPTION_COUNT);

        room.status = RoomStatus::Completed;
        let state = projector.project(&mut rng, &room);
        assert!(!state.started);
        assert!(state.ended);
    }

    #[test]
    fn test_options_stable_across_rebuilds() {
        let mut rng = SessionRng::new(2);
        let mut projector = Projector::new("r".into());

        let mut room = networked_room();
        room.questions.insert(0, QuestionRecord { a: 3, b: 9 });

        let first = projector.project(&mut rng, &room).questions[0].clone();
        room.players.get_mut("alice-id").unwrap().score = 1;
        let second = projector.project(&mut rng, &room).questions[0].clone();

        // Unrelated room changes must not reshuffle presented options
        assert_eq!(first, second);

        // Changed operands (fresh round) regenerate
        room.questions.insert(0, QuestionRecord { a: 4, b: 4 });
        let third = projector.project(&mut rng, &room).questions[0].clone();
        assert_eq!(third.answer(), 8);
    }

    #[tokio::test]
    async fn test_ensure_questions_keeps_first_batch() {
        let store = MemoryStore::new();
        store.create("r".into(), networked_room()).await.unwrap();

        let mut rng_a = SessionRng::new(10);
        let mut rng_b = SessionRng::new(20);
        let batch_a = question::generate_batch(&mut rng_a, 1, 10, 10);
        let batch_b = question::generate_batch(&mut rng_b, 1, 10, 10);

        let first = ensure_questions(&store, "r", batch_a.clone()).await.unwrap();
        let second = ensure_questions(&store, "r", batch_b).await.unwrap();

        assert!(first);
        assert!(!second);
        let room = store.get("r").await.unwrap().unwrap();
        assert_eq!(room.questions, batch_a);
    }

    #[tokio::test]
    async fn test_push_answer_through_store() {
        let store = MemoryStore::new();
        let mut room = networked_room();
        room.questions.insert(0, QuestionRecord { a: 6, b: 6 });
        store.create("r".into(), room).await.unwrap();

        let profile = GameProfile::networked();
        let mut rng = SessionRng::new(3);

        let outcome = push_answer(&store, &profile, &mut rng, "r", &"alice-id".into(), 0, 12)
            .await
            .unwrap();
        assert!(outcome.is_accepted());

        let wrong = push_answer(&store, &profile, &mut rng, "r", &"bob-id".into(), 1, 999)
            .await
            .unwrap();
        assert!(!wrong.is_accepted());

        let room = store.get("r").await.unwrap().unwrap();
        assert_eq!(room.players["alice-id"].score, 1);
        assert_eq!(room.current_question_index, 1);
    }

    #[tokio::test]
    async fn test_watcher_publishes_and_generates_batch() {
        let store: Arc<dyn RoomStore> = Arc::new(MemoryStore::new());
        store.create("r".into(), networked_room()).await.unwrap();

        let (state_tx, mut state_rx) = watch::channel(GameState::default());
        let handle = RoomWatcher::spawn(
            Arc::clone(&store),
            GameProfile::networked(),
            "r".into(),
            "alice-id",
            Arc::new(state_tx),
        )
        .await
        .unwrap();

        // The watcher observes "active, no questions" and writes the batch;
        // the resulting snapshot carries all ten questions.
        let state = state_rx
            .wait_for(|state| state.questions.len() == 10)
            .await
            .unwrap()
            .clone();
        assert!(state.started);
        assert!(!state.waiting_for_opponent);
        assert_eq!(state.players.len(), 2);

        let room = store.get("r").await.unwrap().unwrap();
        assert_eq!(room.questions.len(), 10);

        handle.abort();
    }
}
