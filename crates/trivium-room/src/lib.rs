//! Room orchestration for Trivium.
//!
//! Three pieces:
//! - [`RoomStore`] — creates rooms, owns the code → handle map, and
//!   routes timer fires back into actors.
//! - The room actor (reached through [`RoomHandle`]) — one task per
//!   room that owns the room state and serializes every event touching
//!   it: registration, attach/detach, client actions, timer deadlines.
//! - [`registration`] — identity reservation and reconnection tokens.
//!
//! The actor drives the game through the pure rules in `trivium-game`
//! and broadcasts a fresh snapshot after every accepted state change.

mod actor;
mod error;
pub mod registration;
mod store;

pub use actor::{PlayerSender, RoomHandle, RoomInfo};
pub use error::{RegistrationError, RoomError};
pub use registration::RegisterOutcome;
pub use store::{RoomStore, run_timer_dispatcher};
