//! Scoring/Turn Engine
//!
//! Applies an answer submission to the authoritative room record and
//! computes the next state. The caller runs this inside the store's
//! conditional update, so the duplicate-credit check here is re-checked
//! against current state at commit time; two players racing the same
//! question index credit exactly one.

use tracing::debug;

use crate::store::room::{AnswerRecord, PlayerId, QuestionRecord, Room, RoomStatus};

/// Result of applying one answer submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Submission committed; state advanced.
    Accepted {
        /// Player credited.
        player_id: PlayerId,
        /// Their score after the credit.
        new_score: u32,
        /// The question index now in play (== question count when ended).
        next_index: usize,
        /// Whether this submission finished the match.
        ended: bool,
    },
    /// Submission ignored; room untouched.
    Rejected(RejectReason),
}

impl SubmitOutcome {
    /// Whether the submission was committed.
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted { .. })
    }
}

/// Why a submission was ignored.
///
/// None of these surface to the player; the presentation layer has no
/// feedback channel for wrong or late answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Match already finished.
    GameEnded,
    /// Match not running yet.
    NotStarted,
    /// Submitted for an index other than the one in play.
    StaleIndex,
    /// A winning answer is already recorded for this index.
    AlreadyResolved,
    /// No question record exists at this index yet.
    QuestionMissing,
    /// Submitter is not in the room.
    UnknownPlayer,
    /// Selected value is not the correct answer.
    WrongAnswer,
}

fn rejected(reason: RejectReason) -> SubmitOutcome {
    debug!(?reason, "answer submission ignored");
    SubmitOutcome::Rejected(reason)
}

/// Apply a validated answer submission to the room.
///
/// On acceptance: records the winning answer for the index (insert-only),
/// credits the submitter with one point, and advances the question index.
/// Reaching `question_count` completes the room; otherwise a question is
/// guaranteed at the new index, installing `spare_question` if none was
/// pre-generated (the lazy local profile; batch rooms already hold all
/// ten).
///
/// Any rejection leaves the room bit-for-bit unchanged.
pub fn submit_answer(
    room: &mut Room,
    question_count: usize,
    player_id: &PlayerId,
    question_index: usize,
    selected: i32,
    now: i64,
    spare_question: Option<QuestionRecord>,
) -> SubmitOutcome {
    match room.status {
        RoomStatus::Completed => return rejected(RejectReason::GameEnded),
        RoomStatus::Waiting => return rejected(RejectReason::NotStarted),
        RoomStatus::Active => {}
    }

    if question_index != room.current_question_index {
        return rejected(RejectReason::StaleIndex);
    }

    // First committed answer wins; everything after is a no-op.
    if room.answers.contains_key(&question_index) {
        return rejected(RejectReason::AlreadyResolved);
    }

    let question = match room.question(question_index) {
        Some(q) => q,
        None => return rejected(RejectReason::QuestionMissing),
    };

    let new_score = match room.players.get_mut(player_id) {
        Some(player) if selected == question.answer() => {
            player.score += 1;
            player.score
        }
        Some(_) => return rejected(RejectReason::WrongAnswer),
        None => return rejected(RejectReason::UnknownPlayer),
    };

    room.answers.insert(
        question_index,
        AnswerRecord {
            player_id: player_id.clone(),
            correct: true,
            timestamp: now,
        },
    );

    let next_index = question_index + 1;
    room.current_question_index = next_index;

    let ended = next_index >= question_count;
    if ended {
        room.status = RoomStatus::Completed;
    } else if !room.questions.contains_key(&next_index) {
        if let Some(spare) = spare_question {
            room.questions.insert(next_index, spare);
        }
    }

    SubmitOutcome::Accepted {
        player_id: player_id.clone(),
        new_score,
        next_index,
        ended,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const COUNT: usize = 10;

    fn active_room() -> Room {
        let mut room = Room::with_created_at(0);
        room.add_player("a".into(), "Alice");
        room.add_player("b".into(), "Bob");
        let mut questions = BTreeMap::new();
        questions.insert(0, QuestionRecord { a: 3, b: 4 });
        room.begin_round(questions);
        room
    }

    fn spare() -> Option<QuestionRecord> {
        Some(QuestionRecord { a: 1, b: 1 })
    }

    #[test]
    fn test_correct_answer_scores_and_advances() {
        let mut room = active_room();
        let outcome = submit_answer(&mut room, COUNT, &"a".into(), 0, 7, 100, spare());

        assert_eq!(
            outcome,
            SubmitOutcome::Accepted {
                player_id: "a".into(),
                new_score: 1,
                next_index: 1,
                ended: false,
            }
        );
        assert_eq!(room.players["a"].score, 1);
        assert_eq!(room.players["b"].score, 0);
        assert_eq!(room.current_question_index, 1);
        assert_eq!(room.winning_answer(0).unwrap().player_id, "a");
        assert_eq!(room.winning_answer(0).unwrap().timestamp, 100);
        // Spare installed at the new index
        assert_eq!(room.question(1), Some(QuestionRecord { a: 1, b: 1 }));
    }

    #[test]
    fn test_wrong_answer_never_mutates() {
        let mut room = active_room();
        let before = room.clone();

        let outcome = submit_answer(&mut room, COUNT, &"a".into(), 0, 8, 100, spare());

        assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::WrongAnswer));
        assert_eq!(room, before);
    }

    #[test]
    fn test_stale_index_rejected() {
        let mut room = active_room();
        let before = room.clone();

        let outcome = submit_answer(&mut room, COUNT, &"a".into(), 3, 7, 100, spare());

        assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::StaleIndex));
        assert_eq!(room, before);
    }

    #[test]
    fn test_resolved_index_is_idempotent() {
        let mut room = active_room();
        assert!(submit_answer(&mut room, COUNT, &"a".into(), 0, 7, 100, spare()).is_accepted());

        // Manually wind the index back to simulate a second client whose
        // projection has not caught up yet.
        room.current_question_index = 0;
        let before = room.clone();
        let outcome = submit_answer(&mut room, COUNT, &"b".into(), 0, 7, 101, spare());

        assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::AlreadyResolved));
        assert_eq!(room, before);
        assert_eq!(room.players["b"].score, 0);
    }

    #[test]
    fn test_waiting_room_rejects() {
        let mut room = Room::with_created_at(0);
        room.add_player("a".into(), "Alice");
        let before = room.clone();

        let outcome = submit_answer(&mut room, COUNT, &"a".into(), 0, 7, 100, spare());

        assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::NotStarted));
        assert_eq!(room, before);
    }

    #[test]
    fn test_unknown_player_rejected() {
        let mut room = active_room();
        let before = room.clone();

        let outcome = submit_answer(&mut room, COUNT, &"ghost".into(), 0, 7, 100, spare());

        assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::UnknownPlayer));
        assert_eq!(room, before);
    }

    #[test]
    fn test_missing_question_rejected() {
        let mut room = active_room();
        room.questions.clear();
        let before = room.clone();

        let outcome = submit_answer(&mut room, COUNT, &"a".into(), 0, 7, 100, spare());

        assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::QuestionMissing));
        assert_eq!(room, before);
    }

    #[test]
    fn test_tenth_answer_completes_the_match() {
        let mut room = active_room();

        for index in 0..COUNT {
            let question = room.question(index).expect("question in play");
            let outcome = submit_answer(
                &mut room,
                COUNT,
                &"a".into(),
                index,
                question.answer(),
                index as i64,
                spare(),
            );
            assert!(outcome.is_accepted(), "submission {} rejected", index);
        }

        assert_eq!(room.status, RoomStatus::Completed);
        assert_eq!(room.current_question_index, COUNT);
        assert_eq!(room.players["a"].score, COUNT as u32);
        // No question generated past the end
        assert!(room.question(COUNT).is_none());

        // And nothing further is accepted
        let before = room.clone();
        let outcome = submit_answer(&mut room, COUNT, &"a".into(), COUNT, 2, 999, spare());
        assert_eq!(outcome, SubmitOutcome::Rejected(RejectReason::GameEnded));
        assert_eq!(room, before);
    }

    #[test]
    fn test_batch_room_needs_no_spare() {
        let mut room = Room::with_created_at(0);
        room.add_player("a".into(), "Alice");
        room.add_player("b".into(), "Bob");
        let questions: BTreeMap<usize, QuestionRecord> =
            (0..COUNT).map(|i| (i, QuestionRecord { a: 1, b: i as i32 })).collect();
        room.begin_round(questions);

        let outcome = submit_answer(&mut room, COUNT, &"b".into(), 0, 1, 5, None);
        assert!(outcome.is_accepted());
        // Batch question at index 1 untouched
        assert_eq!(room.question(1), Some(QuestionRecord { a: 1, b: 1 }));
    }
}
