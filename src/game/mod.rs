//! Game Logic Module
//!
//! The pure duel rules, independent of any store or transport.
//!
//! ## Module Structure
//!
//! - `question`: question generation and distractor options
//! - `state`: client-side game state projection, winner/tie rules
//! - `engine`: scoring/turn state machine over the room record

pub mod engine;
pub mod question;
pub mod state;

// Re-export key types
pub use engine::{submit_answer, RejectReason, SubmitOutcome};
pub use question::Question;
pub use state::{GameState, Player, PlayerRef};
