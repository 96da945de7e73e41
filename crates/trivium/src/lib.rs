//! # Trivium
//!
//! Live multiplayer trivia server. Players pre-register into a room,
//! connect over WebSocket, and play through a timed
//! question/results/game-over loop driven entirely by the server.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trivium::{StaticQuestionSource, TriviumServer};
//!
//! # async fn run(questions: Vec<trivium::Question>) -> Result<(), trivium::TriviumError> {
//! let server = TriviumServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .question_source(Arc::new(StaticQuestionSource::new(questions)))
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod registration;
mod server;

pub use error::TriviumError;
pub use registration::RegistrationService;
pub use server::{TriviumServer, TriviumServerBuilder};

// The types a server embedder or test client needs, re-exported so
// `trivium` is the only crate most users depend on.
pub use trivium_game::{
    AnswerOracle, Difficulty, GameTimings, NormalizingOracle, Question,
    QuestionSource, StaticQuestionSource,
};
pub use trivium_protocol::{
    ClientMessage, CloseReason, ConfigUpdate, GameStatus, PlayerId, RoomCode,
    RoomStateData, ServerMessage,
};
pub use trivium_room::{RegisterOutcome, RegistrationError, RoomError};
