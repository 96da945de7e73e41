//! Core protocol types: identities, message enums, close codes.
//!
//! The JSON shapes here are the contract with the browser client:
//! messages are internally tagged with a SCREAMING_SNAKE_CASE `type`
//! field and carry camelCase payload fields.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity inside a room: their validated display name.
///
/// Identity is decoupled from any live connection — a `PlayerId` stays
/// registered across disconnects and is what scores are keyed by.
/// Serialized transparently, so `PlayerId("Alice")` is just `"Alice"`
/// on the wire (including as a JSON map key).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the player name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A room's short join code (4 uppercase alphanumeric chars, widened to
/// 6 under collision pressure).
///
/// Codes are normalized to uppercase on construction (and on
/// deserialization) so lookups are case-insensitive for clients typing
/// them by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl<'de> Deserialize<'de> for RoomCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(RoomCode::new)
    }
}

impl RoomCode {
    /// Creates a room code, uppercasing the input.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game status
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// Waiting → Playing ⇄ Results → Finished → (closed)
///    ↑                              │
///    └───────── play again ─────────┘
/// ```
///
/// - **Waiting**: lobby. Players register, host tweaks config.
/// - **Playing**: a question is live; answers are accepted.
/// - **Results**: the round's answers and points are on display.
/// - **Finished**: all questions exhausted; winner shown until the
///   game-over grace period closes the room (or the host resets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Results,
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Results => "results",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Config update payload
// ---------------------------------------------------------------------------

/// Partial config update sent by the host via `UPDATE_CONFIG`.
///
/// Fields are applied individually; an absent field leaves the current
/// value untouched. `difficulty` stays a raw string at the wire level —
/// unknown values are ignored (not fatal) by the room layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    /// Enable or disable multiple-choice presentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_choice_enabled: Option<bool>,
    /// Difficulty tier name (e.g. `"enjoyer"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// `CONNECT` must be the first message on a fresh socket; everything
/// else is only meaningful once the connection is attached to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Bind this socket to a pre-registered player slot.
    #[serde(rename_all = "camelCase")]
    Connect {
        room_code: RoomCode,
        player_id: PlayerId,
        session_token: String,
    },

    /// Start the game (host only, lobby only).
    StartGame,

    /// Submit an answer for the current question.
    Answer { answer: String },

    /// Update room configuration (host only, lobby only).
    UpdateConfig { config: ConfigUpdate },

    /// Reset a finished game back to the lobby (host only).
    PlayAgain,

    /// Send an ephemeral reaction to the room.
    #[serde(rename_all = "camelCase")]
    Reaction { reaction_id: u8 },
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Full room snapshot. Broadcast after every accepted
    /// state-changing event.
    #[serde(rename_all = "camelCase")]
    RoomState { room_state: crate::RoomStateData },

    /// The room is closing; the socket will be dropped afterwards.
    RoomClosed,

    /// Something about the sender's last message was rejected.
    /// Sent to that client only, never broadcast.
    Error { message: String },

    /// A player's reaction, rebroadcast to everyone in the room.
    #[serde(rename_all = "camelCase")]
    Reaction { player_id: PlayerId, reaction_id: u8 },
}

// ---------------------------------------------------------------------------
// Close reasons for rejected CONNECT attempts
// ---------------------------------------------------------------------------

/// Why a `CONNECT` was rejected, mapped onto WebSocket close codes in
/// the application range so clients can distinguish the cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// No room with that code exists.
    RoomNotFound,
    /// The player never pre-registered in this room.
    NotRegistered,
    /// The player already has a live connection attached.
    AlreadyConnected,
    /// The supplied session token doesn't match the registered one.
    InvalidToken,
}

impl CloseReason {
    /// The WebSocket close code carried on the close frame.
    pub fn code(self) -> u16 {
        match self {
            Self::RoomNotFound => 4404,
            Self::NotRegistered => 4401,
            Self::AlreadyConnected => 4409,
            Self::InvalidToken => 4403,
        }
    }

    /// Human-readable close frame reason.
    pub fn reason(self) -> &'static str {
        match self {
            Self::RoomNotFound => "room not found",
            Self::NotRegistered => "player not registered in room",
            Self::AlreadyConnected => "player already connected",
            Self::InvalidToken => "invalid session token",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
