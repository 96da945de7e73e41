//! Top-level error type, aggregating the layer errors.

use trivium_protocol::ProtocolError;
use trivium_room::{RegistrationError, RoomError};
use trivium_transport::TransportError;

/// Errors surfaced by the server and registration layers.
#[derive(Debug, thiserror::Error)]
pub enum TriviumError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("room error: {0}")]
    Room(#[from] RoomError),

    #[error("registration rejected: {0}")]
    Registration(#[from] RegistrationError),
}
