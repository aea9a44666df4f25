//! Question Generation
//!
//! Builds arithmetic questions and the four answer options shown for
//! each. Only the operands are shared between clients; options are a
//! presentation concern derived locally, so each client shuffles its
//! own set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::rng::SessionRng;
use crate::store::room::QuestionRecord;
use crate::OPTION_COUNT;

/// Distractor options lie within this distance of the correct answer.
pub const DISTRACTOR_SPREAD: i32 = 5;

/// An arithmetic question as presented to a player.
///
/// # Invariants
///
/// - `options` has exactly [`OPTION_COUNT`] distinct values
/// - every option is non-negative
/// - exactly one option equals `a + b`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// First operand
    pub a: i32,
    /// Second operand
    pub b: i32,
    /// Answer options in presentation order
    pub options: Vec<i32>,
}

impl Question {
    /// The correct answer.
    #[inline]
    pub fn answer(&self) -> i32 {
        self.a + self.b
    }

    /// The stored form of this question (operands only).
    pub fn record(&self) -> QuestionRecord {
        QuestionRecord { a: self.a, b: self.b }
    }
}

/// Generate a question with operands drawn uniformly from `[low, high]`.
///
/// Total for any range with `low >= 0`: the option pool around any
/// non-negative answer always holds enough non-negative candidates.
pub fn generate(rng: &mut SessionRng, low: i32, high: i32) -> Question {
    let a = rng.next_int_range(low, high);
    let b = rng.next_int_range(low, high);
    from_operands(rng, a, b)
}

/// Build the presented question for known operands.
///
/// Starts the option set with the correct answer, then draws candidates
/// `answer + offset` with `offset` uniform over `[-5, 5]` excluding 0,
/// keeping those that are non-negative and unseen, until four options
/// exist. The result is shuffled into presentation order.
pub fn from_operands(rng: &mut SessionRng, a: i32, b: i32) -> Question {
    let answer = a + b;
    let mut options = vec![answer];

    while options.len() < OPTION_COUNT {
        let offset = rng.next_int_range(-DISTRACTOR_SPREAD, DISTRACTOR_SPREAD);
        if offset == 0 {
            continue;
        }
        let candidate = answer + offset;
        if candidate >= 0 && !options.contains(&candidate) {
            options.push(candidate);
        }
    }

    rng.shuffle(&mut options);
    Question { a, b, options }
}

/// Derive the presented question for a stored record.
pub fn options_for(rng: &mut SessionRng, record: QuestionRecord) -> Question {
    from_operands(rng, record.a, record.b)
}

/// Generate a stored question record (operands only, no options).
pub fn generate_record(rng: &mut SessionRng, low: i32, high: i32) -> QuestionRecord {
    QuestionRecord {
        a: rng.next_int_range(low, high),
        b: rng.next_int_range(low, high),
    }
}

/// Generate the full question batch written to a room at game start.
pub fn generate_batch(
    rng: &mut SessionRng,
    low: i32,
    high: i32,
    count: usize,
) -> BTreeMap<usize, QuestionRecord> {
    (0..count)
        .map(|index| (index, generate_record(rng, low, high)))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
