//! Wire protocol for Trivium.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomCode`],
//!   [`PlayerId`], etc.) — the message structures that travel on the wire.
//! - **Snapshot** ([`RoomStateData`] and friends) — the client-visible
//!   projection of a room, carried inside `ROOM_STATE` messages.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer (game state). It doesn't know about connections or rooms — it
//! only knows how to serialize and deserialize messages.

mod codec;
mod error;
mod snapshot;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use snapshot::{
    CurrentQuestion, ReactionData, ResultsData, RoomConfigData, RoomStateData,
};
pub use types::{
    ClientMessage, CloseReason, ConfigUpdate, GameStatus, PlayerId, RoomCode,
    ServerMessage,
};
