//! Game constants and injectable timings.

use std::time::Duration;

/// Maximum points a single question can award (first correct answer).
pub const MAX_SCORE_PER_QUESTION: u32 = 1_000;

/// How long a question stays open, in milliseconds.
pub const QUESTION_TIME_MS: u64 = 15_000;

/// How long the results screen is shown between questions.
pub const RESULTS_TIME_MS: u64 = 10_000;

/// Grace period after the final results before the room closes.
pub const GAME_OVER_TIME_MS: u64 = 60_000;

/// Questions drawn per game.
pub const QUESTIONS_PER_GAME: usize = 10;

/// Maximum player display-name length, in characters after trimming.
pub const MAX_PLAYER_NAME_LENGTH: usize = 20;

/// Maximum accepted answer length, in characters.
pub const MAX_ANSWER_LENGTH: usize = 200;

/// Minimum gap between reactions from the same player.
pub const REACTION_COOLDOWN_MS: u64 = 2_000;

/// Reaction ids clients may send; included in every snapshot.
pub const REACTION_IDS: [u8; 6] = [0, 1, 2, 3, 4, 5];

/// The three phase durations, bundled so tests can shrink them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTimings {
    /// Time a question stays open.
    pub question: Duration,
    /// Time the results screen is shown.
    pub results: Duration,
    /// Time a finished game lingers before the room closes.
    pub game_over: Duration,
}

impl Default for GameTimings {
    fn default() -> Self {
        Self {
            question: Duration::from_millis(QUESTION_TIME_MS),
            results: Duration::from_millis(RESULTS_TIME_MS),
            game_over: Duration::from_millis(GAME_OVER_TIME_MS),
        }
    }
}
