//! Pre-registration surface.
//!
//! Players reserve their identity in a room *before* opening a
//! WebSocket; an HTTP layer in front of the server would call these
//! methods from its create-room and join-room endpoints. The service is
//! a thin veneer over the room store — every decision happens inside
//! the owning room actor.

use std::sync::Arc;

use trivium_room::{RegisterOutcome, RoomError, RoomStore};

use trivium_protocol::RoomCode;

use crate::TriviumError;

/// Room creation and player registration, decoupled from any live
/// connection.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<RoomStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<RoomStore>) -> Self {
        Self { store }
    }

    /// Creates an empty room and returns its join code.
    pub async fn create_room(&self) -> RoomCode {
        self.store.create().await
    }

    /// Registers `name` in a room, or resumes a detached registration
    /// when `resume_token` matches.
    ///
    /// # Errors
    /// `TriviumError::Room` when the room doesn't exist;
    /// `TriviumError::Registration` for per-player rejections (name
    /// taken, game in progress, bad token, invalid name).
    pub async fn register(
        &self,
        code: &RoomCode,
        name: &str,
        resume_token: Option<&str>,
    ) -> Result<RegisterOutcome, TriviumError> {
        let room = self
            .store
            .get(code)
            .await
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        Ok(room.register(name, resume_token).await??)
    }
}
