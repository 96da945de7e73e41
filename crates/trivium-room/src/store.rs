//! Room store: creates rooms, hands out handles, and routes timer
//! fires back into the owning actors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use trivium_game::{AnswerOracle, GameTimings, QuestionSource};
use trivium_protocol::RoomCode;
use trivium_timer::{TimerFired, TimerService};

use crate::actor::{RoomHandle, spawn_room};

/// Alphabet for room codes. Uppercase alphanumeric, typed by hand on
/// phones, so no lowercase and no ambiguity with case.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How many 4-character codes to try before widening to 6.
const CODE_ATTEMPTS: usize = 100;

/// All active rooms, plus the shared services their actors use.
///
/// Shared as an `Arc`: the accept loop creates and looks up rooms, and
/// each actor removes itself on close.
pub struct RoomStore {
    rooms: Mutex<HashMap<RoomCode, RoomHandle>>,
    source: Arc<dyn QuestionSource>,
    oracle: Arc<dyn AnswerOracle>,
    timings: GameTimings,
    timers: TimerService,
}

impl RoomStore {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        oracle: Arc<dyn AnswerOracle>,
        timings: GameTimings,
        timers: TimerService,
    ) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            source,
            oracle,
            timings,
            timers,
        }
    }

    /// Creates a room with a fresh unique code and spawns its actor.
    pub async fn create(self: &Arc<Self>) -> RoomCode {
        let mut rooms = self.rooms.lock().await;
        let code = generate_code(&rooms);
        let handle = spawn_room(code.clone(), Arc::clone(self));
        rooms.insert(code.clone(), handle);
        info!(%code, total = rooms.len(), "room created");
        code
    }

    /// Looks up a room. Codes are uppercased on construction, so
    /// lookups are case-insensitive for clients.
    pub async fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.lock().await.get(code).cloned()
    }

    /// Number of active rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Drops a room's handle. Called by the actor as it exits.
    pub(crate) async fn forget(&self, code: &RoomCode) {
        if self.rooms.lock().await.remove(code).is_some() {
            debug!(%code, "room removed from store");
        }
    }

    pub(crate) fn question_source(&self) -> &Arc<dyn QuestionSource> {
        &self.source
    }

    pub(crate) fn oracle(&self) -> &Arc<dyn AnswerOracle> {
        &self.oracle
    }

    pub(crate) fn timings(&self) -> GameTimings {
        self.timings
    }

    pub(crate) fn timers(&self) -> &TimerService {
        &self.timers
    }
}

/// Forwards timer fires into the owning room actors.
///
/// Runs until the timer service is dropped. Every deadline takes this
/// detour through the actor's command channel so it lands on the
/// room's serialized path.
pub async fn run_timer_dispatcher(
    store: Arc<RoomStore>,
    mut fired: mpsc::UnboundedReceiver<TimerFired>,
) {
    while let Some(TimerFired { code, kind }) = fired.recv().await {
        match store.get(&code).await {
            Some(handle) => {
                // A closed actor just means the fire lost a race with
                // room deletion.
                let _ = handle.timer_fired(kind).await;
            }
            None => {
                debug!(%code, ?kind, "timer fired for closed room, ignoring");
            }
        }
    }
}

/// Generates a code not present in `rooms`: 4 characters, widening to
/// 6 if the short space is too crowded to find a free one quickly.
fn generate_code(rooms: &HashMap<RoomCode, RoomHandle>) -> RoomCode {
    let mut rng = rand::rng();

    for _ in 0..CODE_ATTEMPTS {
        let code = random_code(&mut rng, 4);
        if !rooms.contains_key(&code) {
            return code;
        }
    }

    // 36^6 ≈ 2.2 billion codes; a collision streak here is not a thing.
    loop {
        let code = random_code(&mut rng, 6);
        if !rooms.contains_key(&code) {
            return code;
        }
    }
}

fn random_code(rng: &mut impl Rng, len: usize) -> RoomCode {
    let code: String = (0..len)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}
