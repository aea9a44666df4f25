//! Room Record
//!
//! The authoritative shared record for one two-player match, in exactly
//! the wire shape the store persists (camelCase fields, maps keyed by
//! stringified question index). Every client-visible game state is a
//! projection of this record.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Room identifier in the shared store.
pub type RoomId = String;

/// Player identifier within a room.
pub type PlayerId = String;

/// A room never holds more than two players.
pub const ROOM_CAPACITY: usize = 2;

/// Lifecycle status of a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Created, waiting for an opponent.
    Waiting,
    /// Both players present, match running.
    Active,
    /// Match finished or retired. Rooms are never deleted, only completed.
    Completed,
}

/// A player as stored in the room record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display name, set during setup.
    pub name: String,
    /// Correct answers credited so far.
    pub score: u32,
}

/// A question as stored in the room record: operands only.
///
/// Answer options are a presentation concern and are derived locally by
/// each client, never synchronized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// First operand
    pub a: i32,
    /// Second operand
    pub b: i32,
}

impl QuestionRecord {
    /// The correct answer.
    #[inline]
    pub fn answer(self) -> i32 {
        self.a + self.b
    }
}

/// The winning submission recorded for a question index.
///
/// Insert-only: once present for an index it is never overwritten, so
/// the first committed correct answer keeps the credit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// Who answered.
    pub player_id: PlayerId,
    /// Always true for a retained record; kept for wire compatibility.
    pub correct: bool,
    /// Submission time, epoch millis. Diagnostic only; insertion order
    /// decides credit.
    pub timestamp: i64,
}

/// One match's authoritative shared record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Creation time, epoch millis.
    pub created_at: i64,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Players keyed by id. Key order is the presentation order.
    pub players: BTreeMap<PlayerId, PlayerRecord>,
    /// Questions keyed by index.
    pub questions: BTreeMap<usize, QuestionRecord>,
    /// Index of the question currently in play.
    pub current_question_index: usize,
    /// Winning submissions keyed by question index.
    pub answers: BTreeMap<usize, AnswerRecord>,
}

impl Room {
    /// Create an empty waiting room stamped with the current time.
    pub fn new() -> Self {
        Self::with_created_at(Utc::now().timestamp_millis())
    }

    /// Create an empty waiting room with an explicit creation time.
    pub fn with_created_at(created_at: i64) -> Self {
        Self {
            created_at,
            status: RoomStatus::Waiting,
            players: BTreeMap::new(),
            questions: BTreeMap::new(),
            current_question_index: 0,
            answers: BTreeMap::new(),
        }
    }

    /// Add a player with a zeroed score.
    pub fn add_player(&mut self, id: PlayerId, name: impl Into<String>) {
        self.players.insert(
            id,
            PlayerRecord {
                name: name.into(),
                score: 0,
            },
        );
    }

    /// Whether the room holds its full two players.
    pub fn is_full(&self) -> bool {
        self.players.len() >= ROOM_CAPACITY
    }

    /// The player record at a seat index (players in key order).
    pub fn seat(&self, index: usize) -> Option<(&PlayerId, &PlayerRecord)> {
        self.players.iter().nth(index)
    }

    /// The stored question at an index.
    pub fn question(&self, index: usize) -> Option<QuestionRecord> {
        self.questions.get(&index).copied()
    }

    /// The winning submission for an index, if one was committed.
    pub fn winning_answer(&self, index: usize) -> Option<&AnswerRecord> {
        self.answers.get(&index)
    }

    /// Start a fresh round with the same players.
    ///
    /// Scores are zeroed, previous questions and answers dropped, and
    /// the supplied question records installed. The room goes active.
    pub fn begin_round(&mut self, questions: BTreeMap<usize, QuestionRecord>) {
        for player in self.players.values_mut() {
            player.score = 0;
        }
        self.questions = questions;
        self.answers.clear();
        self.current_question_index = 0;
        self.status = RoomStatus::Active;
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
