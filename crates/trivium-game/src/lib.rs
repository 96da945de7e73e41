//! Game logic for Trivium: the room data model, scoring rules, and
//! state projection.
//!
//! This crate is deliberately free of I/O and async machinery. Rules
//! are plain functions over `&mut Room` taking an explicit `now`, which
//! makes every scoring and transition decision testable without a
//! runtime. The room actor (in `trivium-room`) owns a [`Room`] and
//! calls into here on its serialized event path.
//!
//! External collaborators enter through two traits:
//! - [`QuestionSource`] — where questions come from.
//! - [`AnswerOracle`] — what counts as a correct answer.

pub mod config;
pub mod model;
pub mod oracle;
pub mod projector;
pub mod question;
pub mod rules;

pub use config::GameTimings;
pub use model::{Room, RoomConfig, RoundState};
pub use oracle::{AnswerOracle, NormalizingOracle};
pub use question::{
    Difficulty, Question, QuestionSource, StaticQuestionSource,
};
