//! The client-visible projection of a room.
//!
//! [`RoomStateData`] is what travels inside every `ROOM_STATE` message.
//! It is a *view*, not the room itself: the server builds one per
//! broadcast from its authoritative state, and what it includes depends
//! on the room's status (answers are never on the wire while a question
//! is live, for instance).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{GameStatus, PlayerId, RoomCode};

/// Full snapshot of a room as shown to clients.
///
/// Ordered maps (`BTreeMap`) keep the serialized JSON deterministic,
/// which makes broadcasts diff-friendly on the client and snapshots
/// directly comparable in tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStateData {
    pub room_code: RoomCode,
    pub status: GameStatus,
    /// Current score per player. Every registered player appears here,
    /// connected or not.
    pub scores: BTreeMap<PlayerId, u32>,
    /// Which players currently have a live connection.
    pub connected: Vec<PlayerId>,
    pub host_id: Option<PlayerId>,
    pub question_index: usize,
    pub total_questions: usize,
    pub config: RoomConfigData,
    /// Reaction ids clients may send.
    pub available_reactions: Vec<u8>,
    /// Present while `status == playing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question: Option<CurrentQuestion>,
    /// Present while `status == results` or `finished`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsData>,
    /// Milliseconds left on the phase's timer (playing, results, and
    /// the game-over grace period). Absent in the lobby.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining_ms: Option<u64>,
    /// Winner(s) of the game. Present only when `status == finished`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<PlayerId>>,
}

/// Room configuration as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfigData {
    pub multiple_choice_enabled: bool,
    pub difficulty: String,
}

/// The live question, with the canonical answer stripped out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuestion {
    pub text: String,
    pub category: String,
    /// Shuffled multiple-choice options. Absent when the room runs in
    /// free-text mode or the question has no distractors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Players who have locked in an answer this round. Who answered is
    /// public; *what* they answered is not until results.
    pub answered: Vec<PlayerId>,
}

/// Per-round outcome shown during the results phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsData {
    pub question_text: String,
    pub correct_answer: String,
    /// What each answering player submitted.
    pub answers: BTreeMap<PlayerId, String>,
    pub correct_players: Vec<PlayerId>,
    /// Points earned this round (not cumulative).
    pub points: BTreeMap<PlayerId, u32>,
}

/// A reaction event as rebroadcast to the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionData {
    pub player_id: PlayerId,
    pub reaction_id: u8,
}
