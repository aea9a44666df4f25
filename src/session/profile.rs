//! Game Profiles
//!
//! The local split-screen and networked matchmaking variants are the
//! same controller under two configurations: they differ only in the
//! operand range and in whether questions are written as one batch up
//! front or revealed lazily as answers land.

use crate::QUESTION_COUNT;

/// Configuration for one duel session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameProfile {
    /// Smallest operand drawn.
    pub operand_low: i32,
    /// Largest operand drawn.
    pub operand_high: i32,
    /// Questions per round.
    pub question_count: usize,
    /// Write all questions at game start (networked) instead of
    /// generating each as the previous one resolves (local).
    pub batch_questions: bool,
}

impl GameProfile {
    /// Local split-screen play: operands in `[1, 20]`, lazy questions.
    pub const fn local() -> Self {
        Self {
            operand_low: 1,
            operand_high: 20,
            question_count: QUESTION_COUNT,
            batch_questions: false,
        }
    }

    /// Store-synchronized play: operands in `[1, 10]`, full batch
    /// written when the match starts.
    pub const fn networked() -> Self {
        Self {
            operand_low: 1,
            operand_high: 10,
            question_count: QUESTION_COUNT,
            batch_questions: true,
        }
    }
}

impl Default for GameProfile {
    fn default() -> Self {
        Self::local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        let local = GameProfile::local();
        assert_eq!((local.operand_low, local.operand_high), (1, 20));
        assert!(!local.batch_questions);

        let networked = GameProfile::networked();
        assert_eq!((networked.operand_low, networked.operand_high), (1, 10));
        assert!(networked.batch_questions);

        assert_eq!(local.question_count, 10);
        assert_eq!(networked.question_count, 10);
    }
}
