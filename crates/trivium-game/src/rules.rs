//! Scoring and state-transition rules.
//!
//! Every function here is synchronous, takes the clock as an explicit
//! `now`, and mutates the room directly. Preconditions (who may call
//! what, in which status) are the actor's job; these functions perform
//! the mechanics once the actor has decided the event is legitimate.

use std::collections::HashSet;
use std::time::Instant;

use tracing::warn;

use trivium_protocol::{ConfigUpdate, GameStatus, PlayerId};

use crate::config::{GameTimings, MAX_SCORE_PER_QUESTION, REACTION_COOLDOWN_MS};
use crate::model::{Room, RoundState};
use crate::oracle::AnswerOracle;
use crate::question::Question;

/// Outcome of an answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer was recorded.
    Accepted { correct: bool, points: u32 },
    /// The player already answered this round; nothing changed.
    Duplicate,
}

/// What advancing past the results screen led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion,
    Finished,
}

/// Moves the room from the lobby into the first question. Scores start
/// from zero even if a stale value survived somehow.
pub fn start_game(room: &mut Room, questions: Vec<Question>, now: Instant) {
    room.questions = questions;
    room.question_index = 0;
    room.status = GameStatus::Playing;
    room.round = fresh_round(now);
    room.results_started_at = None;
    room.finished_at = None;
    for score in room.scores.values_mut() {
        *score = 0;
    }
}

/// Records `player`'s answer for the live question.
///
/// First submission wins: a second answer from the same player is a
/// no-op. Correct answers score positionally — the k-th correct answer
/// earns `MAX_SCORE_PER_QUESTION >> k` — except answers arriving after
/// the question window closed, which count as correct but earn 0.
pub fn process_answer(
    room: &mut Room,
    oracle: &dyn AnswerOracle,
    player: &PlayerId,
    answer: &str,
    now: Instant,
    timings: &GameTimings,
) -> AnswerOutcome {
    if room.round.answered.contains(player) {
        return AnswerOutcome::Duplicate;
    }

    let Some(question) = room.questions.get(room.question_index) else {
        warn!(code = %room.code, index = room.question_index,
            "answer for out-of-range question index");
        return AnswerOutcome::Duplicate;
    };

    room.round.answered.insert(player.clone());
    room.round.answers.insert(player.clone(), answer.to_string());

    if !oracle.is_correct(answer, &question.answer) {
        return AnswerOutcome::Accepted { correct: false, points: 0 };
    }

    let late = room
        .round
        .started_at
        .is_none_or(|started| now.duration_since(started) > timings.question);

    // Halve per prior correct answer; shifts past 32 bits floor at 0.
    let position = room.round.correct.len() as u32;
    let points = if late {
        0
    } else {
        MAX_SCORE_PER_QUESTION.checked_shr(position).unwrap_or(0)
    };

    room.round.correct.insert(player.clone());
    room.round.points.insert(player.clone(), points);
    *room.scores.entry(player.clone()).or_insert(0) += points;

    AnswerOutcome::Accepted { correct: true, points }
}

/// True once every registered player has answered. A player who
/// dropped mid-question still holds the round open — the question
/// timer closes it for them.
pub fn all_answered(room: &Room) -> bool {
    !room.players.is_empty()
        && room.players.iter().all(|p| room.round.answered.contains(p))
}

/// Moves the live question onto the results screen.
pub fn show_results(room: &mut Room, now: Instant) {
    room.status = GameStatus::Results;
    room.results_started_at = Some(now);
}

/// Leaves the results screen: opens the next question, or finishes the
/// game when none remain.
pub fn advance_question(room: &mut Room, now: Instant) -> Advance {
    room.question_index += 1;
    room.results_started_at = None;

    if room.question_index >= room.questions.len() {
        room.status = GameStatus::Finished;
        room.finished_at = Some(now);
        Advance::Finished
    } else {
        room.status = GameStatus::Playing;
        room.round = fresh_round(now);
        Advance::NextQuestion
    }
}

/// The player(s) with the top score, sorted by name. More than one
/// entry means a tie.
pub fn winners(room: &Room) -> Vec<PlayerId> {
    let Some(top) = room.scores.values().copied().max() else {
        return Vec::new();
    };
    let mut winners: Vec<PlayerId> = room
        .scores
        .iter()
        .filter(|&(_, score)| *score == top)
        .map(|(player, _)| player.clone())
        .collect();
    winners.sort();
    winners
}

/// Resets a finished game back to the lobby for another round.
///
/// Players who are no longer connected are dropped entirely (their
/// registration, score, and session token); everyone remaining starts
/// again at 0. Config survives. If the host left, the
/// lexicographically least remaining player inherits hosting.
pub fn reset_to_lobby(room: &mut Room, connected: &HashSet<PlayerId>) {
    room.players.retain(|p| connected.contains(p));
    room.scores.retain(|p, _| connected.contains(p));
    room.session_tokens.retain(|p, _| connected.contains(p));
    room.last_reaction.clear();

    for score in room.scores.values_mut() {
        *score = 0;
    }

    if room
        .host_id
        .as_ref()
        .is_none_or(|host| !room.players.contains(host))
    {
        room.host_id = room.players.iter().min().cloned();
    }

    room.status = GameStatus::Waiting;
    room.question_index = 0;
    room.questions.clear();
    room.round = RoundState::default();
    room.results_started_at = None;
    room.finished_at = None;
}

/// Applies a partial config update field by field. Unknown difficulty
/// names are ignored with a warning rather than rejecting the whole
/// update.
pub fn apply_config_update(room: &mut Room, update: &ConfigUpdate) {
    if let Some(enabled) = update.multiple_choice_enabled {
        room.config.multiple_choice_enabled = enabled;
    }
    if let Some(name) = update.difficulty.as_deref() {
        match name.parse() {
            Ok(difficulty) => room.config.difficulty = difficulty,
            Err(()) => {
                warn!(code = %room.code, difficulty = name,
                    "ignoring unknown difficulty");
            }
        }
    }
}

/// Records a reaction attempt, enforcing the per-player cooldown.
/// Returns whether the reaction should be rebroadcast.
pub fn record_reaction(room: &mut Room, player: &PlayerId, now: Instant) -> bool {
    let cooldown = std::time::Duration::from_millis(REACTION_COOLDOWN_MS);
    if let Some(last) = room.last_reaction.get(player)
        && now.duration_since(*last) < cooldown
    {
        return false;
    }
    room.last_reaction.insert(player.clone(), now);
    true
}

fn fresh_round(now: Instant) -> RoundState {
    RoundState { started_at: Some(now), ..RoundState::default() }
}
