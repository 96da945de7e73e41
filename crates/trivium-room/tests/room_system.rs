//! Integration tests for the room layer: store, actor, registration,
//! and timers working together.
//!
//! All tests run with `start_paused = true`; phase deadlines only pass
//! when a test advances the clock, so the full game loop is exercised
//! deterministically.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use trivium_game::config::{GAME_OVER_TIME_MS, QUESTION_TIME_MS, RESULTS_TIME_MS};
use trivium_game::{
    GameTimings, NormalizingOracle, Question, StaticQuestionSource,
};
use trivium_protocol::{
    ClientMessage, CloseReason, GameStatus, PlayerId, RoomStateData,
    ServerMessage,
};
use trivium_room::{
    RegisterOutcome, RoomHandle, RoomStore, run_timer_dispatcher,
};
use trivium_timer::TimerService;

// =========================================================================
// Harness
// =========================================================================

fn pid(name: &str) -> PlayerId {
    PlayerId::from(name)
}

/// Every question answers "Paris" so tests don't depend on draw order.
fn sample_questions(count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| Question {
            text: format!("Question {i}: which city?"),
            category: "Geography".into(),
            answer: "Paris".into(),
            wrong_answers: Some(["Lyon".into(), "Rome".into(), "Oslo".into()]),
            tier: 1,
        })
        .collect()
}

/// A store over `question_count` questions, with its timer dispatcher
/// running.
fn setup(question_count: usize) -> Arc<RoomStore> {
    let (timers, fired) = TimerService::new();
    let store = Arc::new(RoomStore::new(
        Arc::new(StaticQuestionSource::new(sample_questions(question_count))),
        Arc::new(NormalizingOracle),
        GameTimings::default(),
        timers,
    ));
    tokio::spawn(run_timer_dispatcher(Arc::clone(&store), fired));
    store
}

async fn new_room(store: &Arc<RoomStore>) -> RoomHandle {
    let code = store.create().await;
    store.get(&code).await.expect("room just created")
}

/// Registers and attaches a player, returning their outbound channel
/// and session token.
async fn join(
    room: &RoomHandle,
    name: &str,
) -> (mpsc::UnboundedReceiver<ServerMessage>, String) {
    let outcome = room.register(name, None).await.unwrap().unwrap();
    let RegisterOutcome::Registered { player_id, token } = outcome else {
        panic!("expected a fresh registration for {name}");
    };
    let (tx, rx) = mpsc::unbounded_channel();
    room.attach(player_id, token.clone(), tx)
        .await
        .unwrap()
        .unwrap();
    (rx, token)
}

/// Waits until the actor has processed everything queued before this
/// call. `info` rides the same FIFO channel as the commands, so its
/// reply proves the queue drained.
async fn drain(room: &RoomHandle) {
    let _ = room.info().await;
}

/// Advances the paused clock and lets timer tasks and the dispatcher
/// run.
async fn advance_ms(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// The most recent `ROOM_STATE` in the channel, discarding everything
/// before it.
fn last_state(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> RoomStateData {
    let mut latest = None;
    while let Ok(msg) = rx.try_recv() {
        if let ServerMessage::RoomState { room_state } = msg {
            latest = Some(room_state);
        }
    }
    latest.expect("expected at least one ROOM_STATE")
}

fn assert_no_messages(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) {
    assert!(rx.try_recv().is_err(), "expected no pending messages");
}

// =========================================================================
// Registration and connection
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_register_then_attach_sees_lobby_state() {
    let store = setup(10);
    let room = new_room(&store).await;

    let (mut alice, _) = join(&room, "Alice").await;
    drain(&room).await;

    let state = last_state(&mut alice);
    assert_eq!(state.status, GameStatus::Waiting);
    assert_eq!(state.host_id, Some(pid("Alice")));
    assert_eq!(state.scores[&pid("Alice")], 0);
    assert_eq!(state.connected, vec![pid("Alice")]);
    assert!(state.current_question.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_attach_rejections_carry_distinct_reasons() {
    let store = setup(10);
    let room = new_room(&store).await;

    let (_alice, token) = join(&room, "Alice").await;
    // Bob keeps the room alive once Alice detaches below.
    let (_bob, _) = join(&room, "Bob").await;

    // Never registered.
    let (tx, _rx) = mpsc::unbounded_channel();
    assert_eq!(
        room.attach(pid("Mallory"), token.clone(), tx).await.unwrap(),
        Err(CloseReason::NotRegistered)
    );

    // Registered but already attached.
    let (tx, _rx) = mpsc::unbounded_channel();
    assert_eq!(
        room.attach(pid("Alice"), token.clone(), tx).await.unwrap(),
        Err(CloseReason::AlreadyConnected)
    );

    // Registered, detached, wrong token.
    room.detach(pid("Alice")).await;
    let (tx, _rx) = mpsc::unbounded_channel();
    assert_eq!(
        room.attach(pid("Alice"), "wrong".into(), tx).await.unwrap(),
        Err(CloseReason::InvalidToken)
    );
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_with_token_resumes_identity() {
    let store = setup(10);
    let room = new_room(&store).await;

    let (mut alice, token) = join(&room, "Alice").await;
    let (_bob, _) = join(&room, "Bob").await;

    drop(alice);
    room.detach(pid("Alice")).await;
    drain(&room).await;

    let outcome = room.register("Alice", Some(&token)).await.unwrap().unwrap();
    assert_eq!(
        outcome,
        RegisterOutcome::Resumed { player_id: pid("Alice"), token: token.clone() }
    );

    let (tx, rx) = mpsc::unbounded_channel();
    room.attach(pid("Alice"), token, tx).await.unwrap().unwrap();
    drain(&room).await;

    alice = rx;
    let state = last_state(&mut alice);
    assert_eq!(state.connected, vec![pid("Alice"), pid("Bob")]);
}

// =========================================================================
// Lobby actions
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_non_host_cannot_start_or_reconfigure() {
    let store = setup(10);
    let room = new_room(&store).await;
    let (_alice, _) = join(&room, "Alice").await;
    let (_bob, _) = join(&room, "Bob").await;

    room.action(pid("Bob"), ClientMessage::StartGame).await.unwrap();
    drain(&room).await;
    assert_eq!(room.info().await.unwrap().status, GameStatus::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_host_config_update_is_broadcast() {
    let store = setup(10);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;

    room.action(
        pid("Alice"),
        ClientMessage::UpdateConfig {
            config: trivium_protocol::ConfigUpdate {
                multiple_choice_enabled: Some(false),
                difficulty: Some("savant".into()),
            },
        },
    )
    .await
    .unwrap();
    drain(&room).await;

    let state = last_state(&mut alice);
    assert!(!state.config.multiple_choice_enabled);
    assert_eq!(state.config.difficulty, "savant");
}

// =========================================================================
// A full game
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_two_player_game_scores_positionally() {
    let store = setup(1);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;
    let (mut bob, _) = join(&room, "Bob").await;

    room.action(pid("Alice"), ClientMessage::StartGame).await.unwrap();
    drain(&room).await;

    let state = last_state(&mut bob);
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.total_questions, 1);
    let question = state.current_question.expect("live question");
    assert!(question.options.is_some());
    // The wall clock may tick a millisecond between starting the game
    // and projecting the snapshot.
    let remaining = state.time_remaining_ms.expect("countdown while playing");
    assert!(remaining <= QUESTION_TIME_MS && remaining > QUESTION_TIME_MS - 100);

    // Alice answers correctly first; Bob misses.
    room.action(pid("Alice"), ClientMessage::Answer { answer: "paris".into() })
        .await
        .unwrap();
    drain(&room).await;
    let state = last_state(&mut bob);
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.current_question.unwrap().answered, vec![pid("Alice")]);

    room.action(pid("Bob"), ClientMessage::Answer { answer: "Rome".into() })
        .await
        .unwrap();
    drain(&room).await;

    // Everyone answered, so the round closed without waiting out the
    // clock.
    let state = last_state(&mut alice);
    assert_eq!(state.status, GameStatus::Results);
    let results = state.results.expect("results on display");
    assert_eq!(results.correct_answer, "Paris");
    assert_eq!(results.points[&pid("Alice")], 1000);
    assert_eq!(results.correct_players, vec![pid("Alice")]);
    assert_eq!(results.answers[&pid("Bob")], "Rome");
    assert_eq!(state.scores[&pid("Alice")], 1000);
    assert_eq!(state.scores[&pid("Bob")], 0);

    // Results screen times out into the finish (single question game).
    advance_ms(RESULTS_TIME_MS).await;
    drain(&room).await;
    let state = last_state(&mut alice);
    assert_eq!(state.status, GameStatus::Finished);
    assert_eq!(state.winners, Some(vec![pid("Alice")]));
}

#[tokio::test(start_paused = true)]
async fn test_question_timeout_forces_results() {
    let store = setup(1);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;

    room.action(pid("Alice"), ClientMessage::StartGame).await.unwrap();
    drain(&room).await;

    // Nobody answers.
    advance_ms(QUESTION_TIME_MS).await;
    drain(&room).await;

    let state = last_state(&mut alice);
    assert_eq!(state.status, GameStatus::Results);
    let results = state.results.unwrap();
    assert!(results.answers.is_empty());
    assert!(results.correct_players.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_answer_changes_nothing() {
    let store = setup(1);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;
    let (_bob, _) = join(&room, "Bob").await;

    room.action(pid("Alice"), ClientMessage::StartGame).await.unwrap();
    room.action(pid("Alice"), ClientMessage::Answer { answer: "Lyon".into() })
        .await
        .unwrap();
    drain(&room).await;
    let _ = last_state(&mut alice);

    // The second answer is dropped: no broadcast, no score change.
    room.action(pid("Alice"), ClientMessage::Answer { answer: "Paris".into() })
        .await
        .unwrap();
    drain(&room).await;
    assert_no_messages(&mut alice);
}

// =========================================================================
// Finishing, play again, room close
// =========================================================================

/// Drives a one-question game to `finished` with Alice the winner.
async fn finish_game(
    room: &RoomHandle,
    alice: &mut mpsc::UnboundedReceiver<ServerMessage>,
) {
    room.action(pid("Alice"), ClientMessage::StartGame).await.unwrap();
    room.action(pid("Alice"), ClientMessage::Answer { answer: "Paris".into() })
        .await
        .unwrap();
    drain(room).await;
    advance_ms(RESULTS_TIME_MS).await;
    drain(room).await;
    assert_eq!(last_state(alice).status, GameStatus::Finished);
}

#[tokio::test(start_paused = true)]
async fn test_game_over_timeout_closes_the_room() {
    let store = setup(1);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;

    finish_game(&room, &mut alice).await;

    advance_ms(GAME_OVER_TIME_MS).await;

    // Everyone is told, and the room disappears from the store.
    let closed = loop {
        match alice.recv().await.expect("expected ROOM_CLOSED") {
            ServerMessage::RoomClosed => break true,
            _ => continue,
        }
    };
    assert!(closed);

    advance_ms(1).await;
    assert!(store.get(room.code()).await.is_none());
    assert_eq!(store.room_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_play_again_returns_to_lobby_and_cancels_close() {
    let store = setup(1);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;

    finish_game(&room, &mut alice).await;

    room.action(pid("Alice"), ClientMessage::PlayAgain).await.unwrap();
    drain(&room).await;

    let state = last_state(&mut alice);
    assert_eq!(state.status, GameStatus::Waiting);
    assert_eq!(state.scores[&pid("Alice")], 0);
    assert_eq!(state.total_questions, 0);

    // The old game's close deadline must not kill the fresh lobby.
    advance_ms(GAME_OVER_TIME_MS * 2).await;
    drain(&room).await;
    assert!(store.get(room.code()).await.is_some());
    assert_eq!(room.info().await.unwrap().status, GameStatus::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_play_again_prunes_disconnected_players() {
    let store = setup(1);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;
    let (bob_rx, _) = join(&room, "Bob").await;

    room.action(pid("Alice"), ClientMessage::StartGame).await.unwrap();
    room.action(pid("Alice"), ClientMessage::Answer { answer: "Paris".into() })
        .await
        .unwrap();
    room.action(pid("Bob"), ClientMessage::Answer { answer: "Rome".into() })
        .await
        .unwrap();
    drain(&room).await;
    advance_ms(RESULTS_TIME_MS).await;
    drain(&room).await;

    drop(bob_rx);
    room.detach(pid("Bob")).await;
    room.action(pid("Alice"), ClientMessage::PlayAgain).await.unwrap();
    drain(&room).await;

    let state = last_state(&mut alice);
    assert_eq!(state.status, GameStatus::Waiting);
    assert!(!state.scores.contains_key(&pid("Bob")));
    assert_eq!(state.host_id, Some(pid("Alice")));
}

#[tokio::test(start_paused = true)]
async fn test_last_disconnect_deletes_the_room() {
    let store = setup(10);
    let room = new_room(&store).await;
    let (_alice, _) = join(&room, "Alice").await;
    let (_bob, _) = join(&room, "Bob").await;
    assert_eq!(store.room_count().await, 1);

    room.detach(pid("Alice")).await;
    room.detach(pid("Bob")).await;
    drain(&room).await;

    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    assert_eq!(store.room_count().await, 0);
}

// =========================================================================
// Reactions
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_reaction_is_rebroadcast_not_a_state_change() {
    let store = setup(1);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;
    let (mut bob, _) = join(&room, "Bob").await;

    room.action(pid("Alice"), ClientMessage::StartGame).await.unwrap();
    drain(&room).await;
    let _ = last_state(&mut alice);
    let _ = last_state(&mut bob);

    room.action(pid("Bob"), ClientMessage::Reaction { reaction_id: 2 })
        .await
        .unwrap();
    drain(&room).await;

    for rx in [&mut alice, &mut bob] {
        match rx.try_recv().unwrap() {
            ServerMessage::Reaction { player_id, reaction_id } => {
                assert_eq!(player_id, pid("Bob"));
                assert_eq!(reaction_id, 2);
            }
            other => panic!("expected REACTION, got {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_reactions_in_lobby_are_ignored() {
    let store = setup(10);
    let room = new_room(&store).await;
    let (mut alice, _) = join(&room, "Alice").await;
    drain(&room).await;
    let _ = last_state(&mut alice);

    room.action(pid("Alice"), ClientMessage::Reaction { reaction_id: 0 })
        .await
        .unwrap();
    drain(&room).await;
    assert_no_messages(&mut alice);
}
