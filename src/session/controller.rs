//! Session Controller
//!
//! One client's handle on one match: intents in, snapshots out. The
//! controller never mutates game state directly; every intent becomes
//! a single conditional store write, and the published snapshot only
//! changes when the room watcher projects the committed room. An
//! intent therefore either leaves state untouched or transitions it to
//! one fully consistent next state.
//!
//! Session identity lives in an explicit [`SessionContext`] held by
//! the controller instance; there are no process-wide globals.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::rng::SessionRng;
use crate::game::question;
use crate::game::state::{GameState, PlayerRef};
use crate::session::profile::GameProfile;
use crate::store::room::{PlayerId, QuestionRecord, Room, RoomId, RoomStatus};
use crate::store::{RoomStore, StoreError};
use crate::sync::adapter::{push_answer, RoomWatcher};
use crate::sync::matchmaking::find_or_create_room;

/// Session failures surfaced to the presentation layer.
///
/// Everything else (wrong answers, stale indices, duplicate
/// submissions, mid-game store hiccups) is deliberately silent: the UI
/// has no feedback channel for them. At most it is logged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// An intent arrived before any match was set up.
    #[error("no active session")]
    NoSession,

    /// A player name was blank at setup validation.
    #[error("player name must not be blank")]
    BlankName,

    /// The shared store could not be reached during matchmaking/join.
    #[error("shared store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Identifiers binding a controller to its current room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    /// The room this session projects and writes.
    pub room_id: RoomId,
    /// This client's own player id. `None` for local split-screen
    /// sessions, which address both seats instead.
    pub local_player: Option<PlayerId>,
}

/// Orchestrates one client's match session.
pub struct SessionController {
    store: Arc<dyn RoomStore>,
    profile: GameProfile,
    rng: SessionRng,
    context: Option<SessionContext>,
    state_tx: Arc<watch::Sender<GameState>>,
    watcher: Option<JoinHandle<()>>,
}

impl SessionController {
    /// Create a controller with no active session.
    pub fn new(store: Arc<dyn RoomStore>, profile: GameProfile) -> Self {
        let (state_tx, _) = watch::channel(GameState::default());
        Self {
            store,
            profile,
            rng: SessionRng::for_session("controller", &Uuid::new_v4().to_string()),
            context: None,
            state_tx: Arc::new(state_tx),
            watcher: None,
        }
    }

    /// Subscribe to the read-only snapshot stream.
    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.state_tx.subscribe()
    }

    /// The current snapshot.
    pub fn state(&self) -> GameState {
        self.state_tx.borrow().clone()
    }

    /// The current session identifiers, if a match is set up.
    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    // =========================================================================
    // SETUP INTENTS
    // =========================================================================

    /// Set up a local split-screen match: one room, both seats local,
    /// names to be filled in before [`Self::start_game`].
    pub async fn new_local_match(&mut self) -> Result<(), SessionError> {
        self.teardown().await;

        let room_id: RoomId = format!("local-{}", Uuid::new_v4());
        let mut room = Room::new();
        room.add_player("0".into(), "");
        room.add_player("1".into(), "");
        self.store.create(room_id.clone(), room).await?;

        self.attach(room_id, None, "local").await?;
        Ok(())
    }

    /// Matchmake into a shared room under the given name.
    ///
    /// The one intent that surfaces store failures.
    pub async fn join_or_create_room(&mut self, name: &str) -> Result<(), SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::BlankName);
        }
        self.teardown().await;

        let joined = find_or_create_room(self.store.as_ref(), name).await?;
        let salt = joined.player_id.clone();
        self.attach(joined.room_id, Some(joined.player_id), &salt).await?;
        Ok(())
    }

    /// Rename a seat during setup. After the match starts this is a
    /// validation no-op.
    pub async fn set_player_name(&mut self, seat: usize, name: &str) -> Result<(), SessionError> {
        let context = self.context.as_ref().ok_or(SessionError::NoSession)?;
        let name = name.to_string();

        self.store
            .update(
                &context.room_id,
                Box::new(move |room| {
                    if room.status != RoomStatus::Waiting {
                        debug!(seat, "name change ignored after setup");
                        return false;
                    }
                    let key = match room.players.keys().nth(seat) {
                        Some(key) => key.clone(),
                        None => return false,
                    };
                    match room.players.get_mut(&key) {
                        Some(player) => {
                            player.name = name;
                            true
                        }
                        None => false,
                    }
                }),
            )
            .await?;
        Ok(())
    }

    /// Start a local match. Fails setup validation if either seat's
    /// name is blank; the session stays un-started and unmutated.
    pub async fn start_game(&mut self) -> Result<(), SessionError> {
        let room_id = self
            .context
            .as_ref()
            .ok_or(SessionError::NoSession)?
            .room_id
            .clone();
        if self.profile.batch_questions {
            // Networked matches start when the opponent joins.
            debug!("start intent ignored for a matchmade session");
            return Ok(());
        }

        let room = self
            .store
            .get(&room_id)
            .await?
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;
        if room.players.values().any(|p| p.name.trim().is_empty()) {
            return Err(SessionError::BlankName);
        }

        let questions = self.starting_questions();
        self.store
            .update(
                &room_id,
                Box::new(move |room| {
                    let startable = room.status == RoomStatus::Waiting
                        && room.players.values().all(|p| !p.name.trim().is_empty());
                    if startable {
                        room.begin_round(questions);
                    }
                    startable
                }),
            )
            .await?;

        info!(room = %room_id, "match started");
        Ok(())
    }

    // =========================================================================
    // PLAY INTENTS
    // =========================================================================

    /// Submit an answer for the question currently shown.
    ///
    /// All validation happens in the scoring engine inside the store
    /// write; a wrong, late, or duplicate answer changes nothing and
    /// reports nothing.
    pub async fn submit_answer(&mut self, player: PlayerRef, value: i32) -> Result<(), SessionError> {
        let context = self.context.clone().ok_or(SessionError::NoSession)?;
        let snapshot = self.state();

        let player_id: PlayerId = match snapshot.player(&player) {
            Some(player) => player.id.clone(),
            None => {
                debug!(?player, "submission from unknown seat ignored");
                return Ok(());
            }
        };

        let result = push_answer(
            self.store.as_ref(),
            &self.profile,
            &mut self.rng,
            &context.room_id,
            &player_id,
            snapshot.current_question_index,
            value,
        )
        .await;

        match result {
            Ok(outcome) => debug!(?outcome, "submission applied"),
            // Mid-game store failures are not surfaced; the snapshot
            // simply stays at the last-known-good state.
            Err(err) => warn!(%err, "submission lost to store failure"),
        }
        Ok(())
    }

    /// Start a fresh round with the same players: scores zeroed, new
    /// questions, question index back to 0.
    pub async fn reset_round(&mut self) -> Result<(), SessionError> {
        let room_id = self
            .context
            .as_ref()
            .ok_or(SessionError::NoSession)?
            .room_id
            .clone();
        let questions = self.starting_questions();

        self.store
            .update(
                &room_id,
                Box::new(move |room| {
                    room.begin_round(questions);
                    true
                }),
            )
            .await?;

        info!(room = %room_id, "round reset");
        Ok(())
    }

    /// Full teardown: retire the room, cancel the subscription, return
    /// to the pristine setup state.
    pub async fn reset_session(&mut self) -> Result<(), SessionError> {
        let context = self.context.take();
        // Unsubscribe before retiring the room so the watcher cannot
        // publish the retired state over the pristine one below.
        self.teardown().await;

        if let Some(context) = context {
            let retired = self
                .store
                .update(
                    &context.room_id,
                    Box::new(|room| {
                        let open = room.status != RoomStatus::Completed;
                        if open {
                            room.status = RoomStatus::Completed;
                        }
                        open
                    }),
                )
                .await;
            if let Err(err) = retired {
                // Teardown proceeds regardless; worst case the room
                // lingers in the store until its players give up on it.
                warn!(%err, room = %context.room_id, "could not retire room");
            }
        }
        self.state_tx.send_replace(GameState::default());
        Ok(())
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// The question records a round starts with, per profile.
    fn starting_questions(&mut self) -> BTreeMap<usize, QuestionRecord> {
        if self.profile.batch_questions {
            question::generate_batch(
                &mut self.rng,
                self.profile.operand_low,
                self.profile.operand_high,
                self.profile.question_count,
            )
        } else {
            let mut questions = BTreeMap::new();
            questions.insert(
                0,
                question::generate_record(
                    &mut self.rng,
                    self.profile.operand_low,
                    self.profile.operand_high,
                ),
            );
            questions
        }
    }

    /// Spawn the room watcher and wait for its first snapshot, so the
    /// intent returns with `state()` already reflecting the room.
    async fn attach(
        &mut self,
        room_id: RoomId,
        local_player: Option<PlayerId>,
        salt: &str,
    ) -> Result<(), SessionError> {
        let watcher = RoomWatcher::spawn(
            Arc::clone(&self.store),
            self.profile,
            room_id.clone(),
            salt,
            Arc::clone(&self.state_tx),
        )
        .await?;
        self.watcher = Some(watcher);

        let mut rx = self.state_tx.subscribe();
        let _ = rx.wait_for(|state| state.room_id == room_id).await;

        self.context = Some(SessionContext {
            room_id,
            local_player,
        });
        Ok(())
    }

    /// Cancel the room subscription, guaranteed on session teardown.
    /// Waits the watcher out so no stale snapshot lands afterwards.
    async fn teardown(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
            let _ = watcher.await;
        }
        self.context = None;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
