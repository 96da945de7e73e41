//! Room actor: an isolated Tokio task that owns one room.
//!
//! Every event that can touch a room — registration, connection
//! attach/detach, client actions, timer fires — arrives on the actor's
//! single mpsc channel. That gives per-room serialization (no locks
//! around game state, no event interleaving bugs) while rooms stay
//! fully parallel with each other.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use trivium_game::config::{
    MAX_ANSWER_LENGTH, QUESTIONS_PER_GAME, REACTION_IDS,
};
use trivium_game::rules::{self, Advance, AnswerOutcome};
use trivium_game::{GameTimings, Room, projector};
use trivium_protocol::{
    ClientMessage, CloseReason, GameStatus, PlayerId, RoomCode, ServerMessage,
};
use trivium_timer::TimerKind;

use crate::error::{RegistrationError, RoomError};
use crate::registration::{self, RegisterOutcome};
use crate::store::RoomStore;

/// Channel for delivering outbound messages to one player's connection
/// handler.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Command channel depth per room. Fills only if a room's events
/// outpace its actor, which backpressures the senders.
const CHANNEL_SIZE: usize = 64;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Reserve (or resume) a player identity.
    Register {
        name: String,
        resume_token: Option<String>,
        reply: oneshot::Sender<Result<RegisterOutcome, RegistrationError>>,
    },

    /// Bind a live connection to a registered identity.
    Attach {
        player_id: PlayerId,
        token: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), CloseReason>>,
    },

    /// A connection went away. Registration survives.
    Detach { player_id: PlayerId },

    /// A client action from an attached connection.
    Action {
        player_id: PlayerId,
        message: ClientMessage,
    },

    /// A phase deadline elapsed.
    TimerFired { kind: TimerKind },

    /// Request room metadata.
    Info { reply: oneshot::Sender<RoomInfo> },
}

/// Room metadata snapshot for the store and tests.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub status: GameStatus,
    pub registered: usize,
    pub connected: usize,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Registers a player, or resumes a detached one.
    pub async fn register(
        &self,
        name: &str,
        resume_token: Option<&str>,
    ) -> Result<Result<RegisterOutcome, RegistrationError>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Register {
                name: name.to_string(),
                resume_token: resume_token.map(str::to_string),
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Attaches a connection. On rejection the caller closes the
    /// socket with the returned reason's close code.
    pub async fn attach(
        &self,
        player_id: PlayerId,
        token: String,
        sender: PlayerSender,
    ) -> Result<Result<(), CloseReason>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Attach {
                player_id,
                token,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Reports a dropped connection (fire-and-forget).
    pub async fn detach(&self, player_id: PlayerId) {
        let _ = self.sender.send(RoomCommand::Detach { player_id }).await;
    }

    /// Delivers a client action (fire-and-forget).
    pub async fn action(
        &self,
        player_id: PlayerId,
        message: ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Action { player_id, message })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Delivers a timer fire (fire-and-forget).
    pub async fn timer_fired(&self, kind: TimerKind) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::TimerFired { kind })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Requests room metadata.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The actor's internal state. Runs inside one Tokio task.
struct RoomActor {
    room: Room,
    /// Live connections per player. Registration lives in `room`;
    /// this map is only who can currently receive broadcasts.
    connections: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
    store: Arc<RoomStore>,
    timings: GameTimings,
}

impl RoomActor {
    async fn run(mut self) {
        info!(code = %self.room.code, "room opened");

        while let Some(cmd) = self.receiver.recv().await {
            let keep_going = match cmd {
                RoomCommand::Register { name, resume_token, reply } => {
                    let connected = self.connected_set();
                    let result = registration::register(
                        &mut self.room,
                        &connected,
                        &name,
                        resume_token.as_deref(),
                    );
                    let roster_changed = matches!(
                        result,
                        Ok(RegisterOutcome::Registered { .. })
                    );
                    let _ = reply.send(result);
                    if roster_changed { self.broadcast_state() } else { true }
                }
                RoomCommand::Attach { player_id, token, sender, reply } => {
                    let result = self.handle_attach(player_id, token, sender);
                    let accepted = result.is_ok();
                    let _ = reply.send(result);
                    if accepted { self.broadcast_state() } else { true }
                }
                RoomCommand::Detach { player_id } => {
                    self.handle_detach(player_id)
                }
                RoomCommand::Action { player_id, message } => {
                    self.handle_action(player_id, message).await
                }
                RoomCommand::TimerFired { kind } => {
                    self.handle_timer(kind).await
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(RoomInfo {
                        code: self.room.code.clone(),
                        status: self.room.status,
                        registered: self.room.players.len(),
                        connected: self.connections.len(),
                    });
                    true
                }
            };

            if !keep_going {
                self.close().await;
                return;
            }
        }

        // Channel closed from outside (store dropped the handle).
        self.close().await;
    }

    // -----------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------

    fn handle_attach(
        &mut self,
        player_id: PlayerId,
        token: String,
        sender: PlayerSender,
    ) -> Result<(), CloseReason> {
        if !self.room.players.contains(&player_id) {
            return Err(CloseReason::NotRegistered);
        }
        if self.connections.contains_key(&player_id) {
            return Err(CloseReason::AlreadyConnected);
        }
        if self.room.session_tokens.get(&player_id) != Some(&token) {
            return Err(CloseReason::InvalidToken);
        }

        self.connections.insert(player_id.clone(), sender);
        info!(code = %self.room.code, %player_id,
            connected = self.connections.len(), "player connected");
        Ok(())
    }

    fn handle_detach(&mut self, player_id: PlayerId) -> bool {
        if self.connections.remove(&player_id).is_none() {
            return true;
        }
        info!(code = %self.room.code, %player_id,
            connected = self.connections.len(), "player disconnected");

        if self.connections.is_empty() {
            // Last person out turns off the lights.
            return false;
        }
        self.broadcast_state()
    }

    // -----------------------------------------------------------------
    // Client actions
    // -----------------------------------------------------------------

    async fn handle_action(
        &mut self,
        player_id: PlayerId,
        message: ClientMessage,
    ) -> bool {
        if !self.connections.contains_key(&player_id) {
            warn!(code = %self.room.code, %player_id,
                "action from unattached player, ignoring");
            return true;
        }

        match message {
            ClientMessage::StartGame => self.handle_start(&player_id).await,
            ClientMessage::Answer { answer } => {
                self.handle_answer(&player_id, &answer).await
            }
            ClientMessage::UpdateConfig { config } => {
                if !self.room.is_host(&player_id)
                    || self.room.status != GameStatus::Waiting
                {
                    debug!(code = %self.room.code, %player_id,
                        status = %self.room.status,
                        "config update rejected, ignoring");
                    return true;
                }
                rules::apply_config_update(&mut self.room, &config);
                self.broadcast_state()
            }
            ClientMessage::PlayAgain => self.handle_play_again(&player_id).await,
            ClientMessage::Reaction { reaction_id } => {
                self.handle_reaction(&player_id, reaction_id)
            }
            ClientMessage::Connect { .. } => {
                // The handshake happens in the connection handler; a
                // CONNECT can't legitimately reach the actor.
                warn!(code = %self.room.code, %player_id,
                    "CONNECT on attached channel, ignoring");
                true
            }
        }
    }

    async fn handle_start(&mut self, player_id: &PlayerId) -> bool {
        if !self.room.is_host(player_id) {
            debug!(code = %self.room.code, %player_id,
                "start from non-host, ignoring");
            return true;
        }
        if self.room.status != GameStatus::Waiting {
            debug!(code = %self.room.code, status = %self.room.status,
                "start outside lobby, ignoring");
            return true;
        }

        let (min_tier, max_tier) = self.room.config.difficulty.tier_range();
        let questions = self.store.question_source().questions_by_difficulty(
            QUESTIONS_PER_GAME,
            min_tier,
            max_tier,
        );
        if questions.is_empty() {
            warn!(code = %self.room.code,
                difficulty = %self.room.config.difficulty,
                "no questions available, not starting");
            self.send_to(
                player_id,
                ServerMessage::Error {
                    message: "no questions available".to_string(),
                },
            );
            return true;
        }

        info!(code = %self.room.code, questions = questions.len(),
            difficulty = %self.room.config.difficulty, "game started");
        rules::start_game(&mut self.room, questions, Instant::now());
        self.store
            .timers()
            .schedule(
                self.room.code.clone(),
                TimerKind::Question,
                self.timings.question,
            )
            .await;
        self.broadcast_state()
    }

    async fn handle_answer(&mut self, player_id: &PlayerId, answer: &str) -> bool {
        if self.room.status != GameStatus::Playing {
            debug!(code = %self.room.code, %player_id,
                status = %self.room.status, "answer outside question, ignoring");
            return true;
        }
        if answer.chars().count() > MAX_ANSWER_LENGTH {
            self.send_to(
                player_id,
                ServerMessage::Error { message: "answer too long".to_string() },
            );
            return true;
        }

        let outcome = rules::process_answer(
            &mut self.room,
            self.store.oracle().as_ref(),
            player_id,
            answer,
            Instant::now(),
            &self.timings,
        );
        match outcome {
            AnswerOutcome::Duplicate => {
                debug!(code = %self.room.code, %player_id,
                    "duplicate answer, ignoring");
                true
            }
            AnswerOutcome::Accepted { correct, points } => {
                debug!(code = %self.room.code, %player_id, correct, points,
                    "answer recorded");
                if rules::all_answered(&self.room) {
                    // The question timer is moot now.
                    self.store
                        .timers()
                        .cancel(&self.room.code, TimerKind::Question)
                        .await;
                    self.enter_results().await;
                }
                // One broadcast whether or not the phase flipped.
                self.broadcast_state()
            }
        }
    }

    async fn handle_play_again(&mut self, player_id: &PlayerId) -> bool {
        if !self.room.is_host(player_id) {
            debug!(code = %self.room.code, %player_id,
                "play-again from non-host, ignoring");
            return true;
        }
        if self.room.status != GameStatus::Finished {
            debug!(code = %self.room.code, status = %self.room.status,
                "play-again outside finished game, ignoring");
            return true;
        }

        // The fresh lobby must outlive the old game's close deadline.
        self.store
            .timers()
            .cancel(&self.room.code, TimerKind::GameOver)
            .await;
        let connected = self.connected_set();
        rules::reset_to_lobby(&mut self.room, &connected);
        info!(code = %self.room.code, players = self.room.players.len(),
            "room reset for another game");
        self.broadcast_state()
    }

    fn handle_reaction(&mut self, player_id: &PlayerId, reaction_id: u8) -> bool {
        if !matches!(
            self.room.status,
            GameStatus::Playing | GameStatus::Results
        ) {
            debug!(code = %self.room.code, %player_id,
                "reaction outside game, ignoring");
            return true;
        }
        if !REACTION_IDS.contains(&reaction_id) {
            debug!(code = %self.room.code, %player_id, reaction_id,
                "unknown reaction, ignoring");
            return true;
        }
        if !rules::record_reaction(&mut self.room, player_id, Instant::now()) {
            debug!(code = %self.room.code, %player_id,
                "reaction on cooldown, ignoring");
            return true;
        }

        self.send_all(&ServerMessage::Reaction {
            player_id: player_id.clone(),
            reaction_id,
        })
    }

    // -----------------------------------------------------------------
    // Timer fires
    // -----------------------------------------------------------------

    async fn handle_timer(&mut self, kind: TimerKind) -> bool {
        match (kind, self.room.status) {
            (TimerKind::Question, GameStatus::Playing) => {
                self.enter_results().await;
                self.broadcast_state()
            }
            (TimerKind::Results, GameStatus::Results) => {
                let now = Instant::now();
                match rules::advance_question(&mut self.room, now) {
                    Advance::NextQuestion => {
                        self.store
                            .timers()
                            .schedule(
                                self.room.code.clone(),
                                TimerKind::Question,
                                self.timings.question,
                            )
                            .await;
                    }
                    Advance::Finished => {
                        info!(code = %self.room.code, "game finished");
                        self.store
                            .timers()
                            .schedule(
                                self.room.code.clone(),
                                TimerKind::GameOver,
                                self.timings.game_over,
                            )
                            .await;
                    }
                }
                self.broadcast_state()
            }
            (TimerKind::GameOver, GameStatus::Finished) => {
                info!(code = %self.room.code, "game-over deadline reached");
                self.send_all(&ServerMessage::RoomClosed);
                false
            }
            (kind, status) => {
                // A fire that raced a cancellation or state change.
                debug!(code = %self.room.code, ?kind, %status,
                    "stale timer fire, ignoring");
                true
            }
        }
    }

    async fn enter_results(&mut self) {
        rules::show_results(&mut self.room, Instant::now());
        self.store
            .timers()
            .schedule(
                self.room.code.clone(),
                TimerKind::Results,
                self.timings.results,
            )
            .await;
    }

    // -----------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------

    fn connected_set(&self) -> HashSet<PlayerId> {
        self.connections.keys().cloned().collect()
    }

    /// Projects and broadcasts the room snapshot. Returns `false` when
    /// pruning dead connections emptied the room.
    fn broadcast_state(&mut self) -> bool {
        let connected = self.connected_set();
        let snapshot = projector::project(
            &mut self.room,
            &connected,
            Instant::now(),
            &self.timings,
        );
        self.send_all(&ServerMessage::RoomState { room_state: snapshot })
    }

    /// Sends to every attached connection, pruning any whose channel is
    /// gone. Returns `false` when pruning emptied the room.
    fn send_all(&mut self, msg: &ServerMessage) -> bool {
        let mut dropped = Vec::new();
        for (player_id, sender) in &self.connections {
            if sender.send(msg.clone()).is_err() {
                dropped.push(player_id.clone());
            }
        }
        if dropped.is_empty() {
            return true;
        }
        for player_id in &dropped {
            warn!(code = %self.room.code, %player_id,
                "send failed, treating as disconnect");
            self.connections.remove(player_id);
        }
        !self.connections.is_empty()
    }

    fn send_to(&self, player_id: &PlayerId, msg: ServerMessage) {
        if let Some(sender) = self.connections.get(player_id) {
            let _ = sender.send(msg);
        }
    }

    // -----------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------

    async fn close(&mut self) {
        self.store.timers().cancel_all(&self.room.code).await;
        self.store.forget(&self.room.code).await;
        info!(code = %self.room.code, "room closed");
    }
}

/// Spawns a room actor task and returns its handle.
pub(crate) fn spawn_room(code: RoomCode, store: Arc<RoomStore>) -> RoomHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_SIZE);

    let actor = RoomActor {
        room: Room::new(code.clone()),
        connections: HashMap::new(),
        receiver: rx,
        timings: store.timings(),
        store,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
