//! Room <-> Game State Synchronization
//!
//! Bidirectional mapping between the authoritative shared room record
//! and the client-side game state, plus the matchmaking flow.
//!
//! ## Module Structure
//!
//! - `adapter`: inbound projection loop and outbound guarded writes
//! - `matchmaking`: find-or-create room flow

pub mod adapter;
pub mod matchmaking;

pub use adapter::{ensure_questions, push_answer, Projector, RoomWatcher};
pub use matchmaking::{find_or_create_room, JoinedRoom};
