//! # Math Duel Engine
//!
//! Game-state synchronization and scoring engine for a two-player
//! turn-based arithmetic duel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MATH DUEL ENGINE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── rng.rs      - Xorshift128+ PRNG + seed derivation       │
//! │                                                              │
//! │  game/           - Game logic (pure, store-agnostic)         │
//! │  ├── question.rs - Question generation, distractor options   │
//! │  ├── state.rs    - Client game state, winner/tie rules       │
//! │  └── engine.rs   - Scoring/turn state machine                │
//! │                                                              │
//! │  store/          - Shared room store                         │
//! │  ├── room.rs     - Authoritative room record                 │
//! │  ├── mod.rs      - RoomStore trait, subscriptions            │
//! │  └── memory.rs   - In-process store implementation           │
//! │                                                              │
//! │  sync/           - Room <-> game state synchronization       │
//! │  ├── adapter.rs  - Projection loop, guarded writes           │
//! │  └── matchmaking.rs - find-or-create room flow               │
//! │                                                              │
//! │  session/        - Presentation-facing orchestration         │
//! │  ├── profile.rs  - Local / networked game profiles           │
//! │  └── controller.rs - Intents + snapshot stream               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Guarantee
//!
//! The authoritative record for a match is always the [`store::Room`]; the
//! presentation-facing [`game::GameState`] is a projection of it. Every
//! mutation runs inside a single conditional [`store::RoomStore::update`]
//! call, so concurrent submissions for the same question credit exactly one
//! player and duplicate question batches are never retained. Subscribers
//! only ever observe fully-applied room states.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod session;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use core::rng::SessionRng;
pub use game::engine::{SubmitOutcome, RejectReason};
pub use game::question::Question;
pub use game::state::{GameState, Player, PlayerRef};
pub use session::controller::{SessionController, SessionError};
pub use session::profile::GameProfile;
pub use store::memory::MemoryStore;
pub use store::{Room, RoomStatus, RoomStore, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Questions per round
pub const QUESTION_COUNT: usize = 10;

/// Answer options presented per question
pub const OPTION_COUNT: usize = 4;
