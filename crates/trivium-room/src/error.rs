//! Error types for the room layer.

use trivium_protocol::RoomCode;

/// Errors from room store and actor operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this code exists.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room's command channel is closed — the actor has exited.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

/// Why a registration attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The display name failed validation.
    #[error("invalid player name: {0}")]
    InvalidName(&'static str),

    /// Someone with this name is connected right now.
    #[error("name already taken")]
    NameTaken,

    /// New players can't join once the game has left the lobby.
    #[error("game already in progress")]
    GameInProgress,

    /// The name is registered but the reconnection token doesn't match.
    #[error("invalid session token")]
    InvalidToken,
}
