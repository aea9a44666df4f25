//! Session Layer
//!
//! What the presentation layer holds: a controller exposing intents
//! and a read-only stream of game state snapshots.
//!
//! ## Module Structure
//!
//! - `profile`: local / networked configuration profiles
//! - `controller`: the session controller and its intents

pub mod controller;
pub mod profile;

pub use controller::{SessionContext, SessionController, SessionError};
pub use profile::GameProfile;
