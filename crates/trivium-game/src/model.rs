//! The authoritative room state.
//!
//! A [`Room`] is owned by exactly one actor task; nothing here is
//! shared or locked. Live connections are *not* part of this model —
//! the actor keeps its own sender map, and rules that need to know who
//! is connected take that set as a parameter.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use trivium_protocol::{GameStatus, PlayerId, RoomCode};

use crate::question::{Difficulty, Question};

/// Host-tunable room settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Present questions as multiple choice when distractors exist.
    pub multiple_choice_enabled: bool,
    pub difficulty: Difficulty,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            multiple_choice_enabled: true,
            difficulty: Difficulty::default(),
        }
    }
}

/// Per-question transient state. Reset when a new question opens.
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    /// When the question opened. `None` outside the playing phase.
    pub started_at: Option<Instant>,
    /// Players who have locked in an answer this round.
    pub answered: HashSet<PlayerId>,
    /// What each answering player submitted.
    pub answers: HashMap<PlayerId, String>,
    /// Players judged correct, including late (zero-point) ones.
    pub correct: HashSet<PlayerId>,
    /// Points earned this round.
    pub points: HashMap<PlayerId, u32>,
    /// Multiple-choice option order, shuffled once per round and cached
    /// so every snapshot shows the same order.
    pub shuffled_options: Option<Vec<String>>,
}

/// Authoritative state of one room.
#[derive(Debug)]
pub struct Room {
    pub code: RoomCode,
    /// Registered identities. Registration survives disconnects.
    pub players: HashSet<PlayerId>,
    pub scores: HashMap<PlayerId, u32>,
    /// First registrant; the only player who may start, reconfigure,
    /// or reset the game.
    pub host_id: Option<PlayerId>,
    pub status: GameStatus,
    pub question_index: usize,
    pub questions: Vec<Question>,
    pub config: RoomConfig,
    pub round: RoundState,
    pub results_started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    /// Per-player reconnection secrets, issued at registration.
    pub session_tokens: HashMap<PlayerId, String>,
    /// Last accepted reaction per player, for cooldown enforcement.
    pub last_reaction: HashMap<PlayerId, Instant>,
}

impl Room {
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            players: HashSet::new(),
            scores: HashMap::new(),
            host_id: None,
            status: GameStatus::Waiting,
            question_index: 0,
            questions: Vec::new(),
            config: RoomConfig::default(),
            round: RoundState::default(),
            results_started_at: None,
            finished_at: None,
            session_tokens: HashMap::new(),
            last_reaction: HashMap::new(),
        }
    }

    pub fn is_host(&self, player: &PlayerId) -> bool {
        self.host_id.as_ref() == Some(player)
    }

    /// The question currently live (or on the results screen).
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.question_index)
    }
}
