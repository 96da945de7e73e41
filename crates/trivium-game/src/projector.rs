//! Projects authoritative room state into the client-visible snapshot.
//!
//! The projector never reveals the canonical answer while a question is
//! live, and only shows per-player answers once the round is on the
//! results screen. Its single permitted mutation is caching the
//! shuffled option order on the round, so every snapshot of the same
//! round shows options in the same order.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use rand::seq::SliceRandom;
use tracing::error;

use trivium_protocol::{
    CurrentQuestion, GameStatus, PlayerId, ResultsData, RoomConfigData,
    RoomStateData,
};

use crate::config::{GameTimings, REACTION_IDS};
use crate::model::Room;
use crate::question::Question;
use crate::rules;

/// Builds the snapshot broadcast to clients after every accepted event.
pub fn project(
    room: &mut Room,
    connected: &HashSet<PlayerId>,
    now: Instant,
    timings: &GameTimings,
) -> RoomStateData {
    let mut connected: Vec<PlayerId> = connected.iter().cloned().collect();
    connected.sort();

    let mut snapshot = RoomStateData {
        room_code: room.code.clone(),
        status: room.status,
        scores: room.scores.iter().map(|(p, s)| (p.clone(), *s)).collect(),
        connected,
        host_id: room.host_id.clone(),
        question_index: room.question_index,
        total_questions: room.questions.len(),
        config: RoomConfigData {
            multiple_choice_enabled: room.config.multiple_choice_enabled,
            difficulty: room.config.difficulty.to_string(),
        },
        available_reactions: REACTION_IDS.to_vec(),
        current_question: None,
        results: None,
        time_remaining_ms: None,
        winners: None,
    };

    match room.status {
        GameStatus::Waiting => {}
        GameStatus::Playing => {
            snapshot.time_remaining_ms =
                remaining_ms(room.round.started_at, timings.question, now);
            match room.questions.get(room.question_index) {
                Some(_) => {
                    let options = options_for(room);
                    let question = &room.questions[room.question_index];
                    let mut answered: Vec<PlayerId> =
                        room.round.answered.iter().cloned().collect();
                    answered.sort();
                    snapshot.current_question = Some(CurrentQuestion {
                        text: question.text.clone(),
                        category: question.category.clone(),
                        options,
                        answered,
                    });
                }
                None => {
                    error!(code = %room.code, index = room.question_index,
                        total = room.questions.len(),
                        "question index out of range while playing");
                }
            }
        }
        GameStatus::Results => {
            snapshot.time_remaining_ms = remaining_ms(
                room.results_started_at,
                timings.results,
                now,
            );
            snapshot.results =
                results_for(room, room.questions.get(room.question_index));
        }
        GameStatus::Finished => {
            snapshot.time_remaining_ms =
                remaining_ms(room.finished_at, timings.game_over, now);
            // The index walked past the end; the last question's round
            // data is still in place.
            snapshot.results = results_for(room, room.questions.last());
            snapshot.winners = Some(rules::winners(room));
        }
    }

    snapshot
}

fn remaining_ms(
    started: Option<Instant>,
    budget: std::time::Duration,
    now: Instant,
) -> Option<u64> {
    let started = started?;
    let remaining = budget.saturating_sub(now.duration_since(started));
    Some(remaining.as_millis() as u64)
}

/// Multiple-choice options for the live question, shuffled once per
/// round and cached.
fn options_for(room: &mut Room) -> Option<Vec<String>> {
    if !room.config.multiple_choice_enabled {
        return None;
    }
    let question = room.questions.get(room.question_index)?;
    let wrong = question.wrong_answers.as_ref()?;

    if room.round.shuffled_options.is_none() {
        let mut options: Vec<String> = Vec::with_capacity(4);
        options.push(question.answer.clone());
        options.extend(wrong.iter().cloned());
        options.shuffle(&mut rand::rng());
        room.round.shuffled_options = Some(options);
    }
    room.round.shuffled_options.clone()
}

fn results_for(room: &Room, question: Option<&Question>) -> Option<ResultsData> {
    let question = match question {
        Some(q) => q,
        None => {
            error!(code = %room.code, index = room.question_index,
                "no question to build results from");
            return None;
        }
    };

    let mut correct_players: Vec<PlayerId> =
        room.round.correct.iter().cloned().collect();
    correct_players.sort();

    Some(ResultsData {
        question_text: question.text.clone(),
        correct_answer: question.answer.clone(),
        answers: room
            .round
            .answers
            .iter()
            .map(|(p, a)| (p.clone(), a.clone()))
            .collect(),
        correct_players,
        points: room
            .round
            .points
            .iter()
            .map(|(p, pts)| (p.clone(), *pts))
            .collect(),
    })
}
