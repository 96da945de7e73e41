//! Phase timers for Trivium rooms.
//!
//! Each room has at most one pending timer per [`TimerKind`]. A fired
//! timer doesn't touch any room itself — it emits a [`TimerFired`]
//! event on the service's dispatch channel, and the server forwards it
//! into the owning room actor's command queue. That keeps every
//! deadline on the room's serialized path: by the time the actor sees
//! the event, it re-checks the room's status, so a fire that raced a
//! cancellation is a harmless no-op.
//!
//! # Integration
//!
//! ```ignore
//! let (timers, mut fired) = TimerService::new();
//! tokio::spawn(async move {
//!     while let Some(event) = fired.recv().await {
//!         // look up the room actor and forward the event
//!     }
//! });
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, trace};

use trivium_protocol::RoomCode;

/// Which phase deadline a timer tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// The question window closed.
    Question,
    /// The results screen is over.
    Results,
    /// A finished game lingered long enough; close the room.
    GameOver,
}

/// A deadline that elapsed without being cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    pub code: RoomCode,
    pub kind: TimerKind,
}

type SlotKey = (RoomCode, TimerKind);

/// Per-slot generation guards against a fired task removing the newer
/// timer that replaced it.
type Slots = HashMap<SlotKey, (u64, tokio::task::AbortHandle)>;

/// Schedules and cancels per-room phase timers.
///
/// Cheap to clone; all clones share the same slots and dispatch
/// channel. Scheduling into an occupied `(room, kind)` slot replaces
/// the pending timer.
#[derive(Debug, Clone)]
pub struct TimerService {
    slots: Arc<Mutex<Slots>>,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
    generation: Arc<AtomicU64>,
}

impl TimerService {
    /// Creates the service and the receiving end of its dispatch
    /// channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let service = Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            fired_tx,
            generation: Arc::new(AtomicU64::new(0)),
        };
        (service, fired_rx)
    }

    /// Arms a timer. Any pending timer in the same `(room, kind)` slot
    /// is aborted first.
    pub async fn schedule(
        &self,
        code: RoomCode,
        kind: TimerKind,
        after: Duration,
    ) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        // Fix the deadline now: the spawned task may not be polled
        // until later, and `sleep` reads the clock at first poll.
        let deadline = tokio::time::Instant::now() + after;
        let slots = Arc::clone(&self.slots);
        let fired_tx = self.fired_tx.clone();
        let key = (code.clone(), kind);
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            // Free the slot, unless a newer timer already took it.
            {
                let mut slots = slots.lock().await;
                if let Some((current, _)) = slots.get(&task_key)
                    && *current == generation
                {
                    slots.remove(&task_key);
                }
            }

            let (code, kind) = task_key;
            trace!(%code, ?kind, "timer fired");
            // Receiver gone means the server is shutting down.
            let _ = fired_tx.send(TimerFired { code, kind });
        });

        let mut slots = self.slots.lock().await;
        if let Some((_, old)) =
            slots.insert(key, (generation, handle.abort_handle()))
        {
            old.abort();
        }
        debug!(%code, ?kind, after_ms = after.as_millis() as u64, "timer armed");
    }

    /// Cancels the pending timer in one slot, if any. A timer whose
    /// fire already reached the dispatch channel is not recalled; the
    /// room actor treats it as stale.
    pub async fn cancel(&self, code: &RoomCode, kind: TimerKind) {
        let mut slots = self.slots.lock().await;
        if let Some((_, handle)) = slots.remove(&(code.clone(), kind)) {
            handle.abort();
            debug!(%code, ?kind, "timer cancelled");
        }
    }

    /// Cancels every pending timer for a room. Called when a room
    /// closes.
    pub async fn cancel_all(&self, code: &RoomCode) {
        for kind in
            [TimerKind::Question, TimerKind::Results, TimerKind::GameOver]
        {
            self.cancel(code, kind).await;
        }
    }

    /// Number of armed timers across all rooms.
    pub async fn pending_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}
