//! Client Game State
//!
//! The presentation-facing snapshot of one match. Always derived from
//! the authoritative room record; never mutated directly by the
//! presentation layer.

use serde::{Deserialize, Serialize};

use crate::game::question::Question;
use crate::store::room::{PlayerId, RoomId};

/// A player as seen by the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Store-level id (seat key `"0"`/`"1"` in local matches).
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Correct answers credited.
    pub score: u32,
}

/// Addresses one of the two players.
///
/// Local split-screen intents use seat indices; networked clients use
/// their store-assigned id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerRef {
    /// Seat position, players in room key order.
    Seat(usize),
    /// Store-level player id.
    Id(PlayerId),
}

/// Snapshot of one match as shown to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Room this state projects, empty before a session exists.
    pub room_id: RoomId,
    /// Players in seat order (0, 1, or 2 entries).
    pub players: Vec<Player>,
    /// Questions revealed so far, with presentation options.
    pub questions: Vec<Question>,
    /// Index of the question currently in play, in `[0, 10]`.
    pub current_question_index: usize,
    /// Whether the match is running.
    pub started: bool,
    /// Whether the match finished (index reached the final question).
    pub ended: bool,
    /// Whether the opponent seat is still empty.
    pub waiting_for_opponent: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            room_id: RoomId::new(),
            players: Vec::new(),
            questions: Vec::new(),
            current_question_index: 0,
            started: false,
            ended: false,
            waiting_for_opponent: true,
        }
    }
}

impl GameState {
    /// The question currently in play.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    /// Resolve a player reference against this snapshot.
    pub fn player(&self, player: &PlayerRef) -> Option<&Player> {
        match player {
            PlayerRef::Seat(index) => self.players.get(*index),
            PlayerRef::Id(id) => self.players.iter().find(|p| &p.id == id),
        }
    }

    /// The winner: strictly greater score, terminal states only.
    pub fn winner(&self) -> Option<&Player> {
        if !self.ended {
            return None;
        }
        let best = self.players.iter().max_by_key(|p| p.score)?;
        let contested = self.players.iter().filter(|p| p.score == best.score).count() > 1;
        if contested {
            None
        } else {
            Some(best)
        }
    }

    /// The runner-up, when a winner exists.
    pub fn loser(&self) -> Option<&Player> {
        let winner_id = &self.winner()?.id;
        self.players.iter().find(|p| &p.id != winner_id)
    }

    /// Whether the match ended with both players on the same positive
    /// score. A 0-0 finish is not a tie; it is unreachable under normal
    /// play anyway.
    pub fn is_tie(&self) -> bool {
        self.ended
            && self.players.len() == 2
            && self.players[0].score == self.players[1].score
            && self.players[0].score > 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
