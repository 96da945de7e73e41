//! Per-connection handler: CONNECT handshake, attach, and message
//! pumping.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive CONNECT → look up the room → attach to its actor
//!   2. Spawn an outbound pump feeding room broadcasts to the socket
//!   3. Loop: decode client messages → forward to the room actor
//!
//! Rejected CONNECTs close the socket with an application close code
//! (4404/4401/4409/4403) so the client can tell the cases apart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use trivium_protocol::{
    ClientMessage, CloseReason, Codec, JsonCodec, PlayerId, ProtocolError,
    RoomCode, ServerMessage,
};
use trivium_room::RoomHandle;
use trivium_transport::{Connection, WebSocketConnection};

use crate::TriviumError;
use crate::server::ServerState;

/// How long a fresh socket gets to send its CONNECT.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Drop guard that detaches the player from the room when the handler
/// exits. Cleanup happens even if the handler panics; since `Drop` is
/// synchronous, the detach rides a fire-and-forget task.
struct DetachGuard {
    player_id: PlayerId,
    room: RoomHandle,
}

impl Drop for DetachGuard {
    fn drop(&mut self) {
        let player_id = self.player_id.clone();
        let room = self.room.clone();
        tokio::spawn(async move {
            room.detach(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), TriviumError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: CONNECT handshake ---
    let (room_code, player_id, session_token) =
        perform_handshake(&conn, &state).await?;

    let Some(room) = state.store.get(&room_code).await else {
        let reason = CloseReason::RoomNotFound;
        let _ = conn.close_with(reason.code(), reason.reason()).await;
        tracing::debug!(%conn_id, code = %room_code, "room not found");
        return Ok(());
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    match room.attach(player_id.clone(), session_token, tx).await {
        Ok(Ok(())) => {}
        Ok(Err(reason)) => {
            let _ = conn.close_with(reason.code(), reason.reason()).await;
            tracing::debug!(%conn_id, %player_id,
                reason = reason.reason(), "attach rejected");
            return Ok(());
        }
        Err(_) => {
            // The room actor died between lookup and attach.
            let reason = CloseReason::RoomNotFound;
            let _ = conn.close_with(reason.code(), reason.reason()).await;
            return Ok(());
        }
    }

    tracing::info!(%conn_id, code = %room_code, %player_id,
        "player attached");
    let _guard = DetachGuard { player_id: player_id.clone(), room: room.clone() };

    // --- Step 2: outbound pump ---
    // Room broadcasts arrive on `rx`; a dedicated task encodes and
    // writes them so the inbound loop below never blocks a broadcast.
    // When the actor drops our sender (room closed, or we got pruned)
    // the pump closes the socket and exits.
    let pump_conn = conn.clone();
    let codec = state.codec;
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, ServerMessage::RoomClosed);
            match codec.encode(&msg) {
                Ok(bytes) => {
                    if pump_conn.send(&bytes).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e,
                        "failed to encode outbound message");
                }
            }
            if closing {
                break;
            }
        }
        let _ = pump_conn.close().await;
    });

    // --- Step 3: inbound loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, %player_id,
                    "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, %player_id, error = %e,
                    "recv error");
                break;
            }
        };

        let message: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                // Malformed input gets an ERROR, not a disconnect.
                tracing::debug!(%conn_id, %player_id, error = %e,
                    "failed to decode message");
                send_error(&conn, &state.codec, "malformed message").await;
                continue;
            }
        };

        if matches!(message, ClientMessage::Connect { .. }) {
            send_error(&conn, &state.codec, "already connected").await;
            continue;
        }

        if room.action(player_id.clone(), message).await.is_err() {
            tracing::debug!(%conn_id, %player_id, "room gone, closing");
            break;
        }
    }

    // _guard drops here → detach fires → the actor drops our sender →
    // the pump closes the socket.
    Ok(())
}

/// Waits for the CONNECT message that must open every connection.
///
/// Anything else — silence, garbage, a different message type — gets
/// the socket closed.
async fn perform_handshake(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
) -> Result<(RoomCode, PlayerId, String), TriviumError> {
    let data =
        match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(ProtocolError::InvalidMessage(
                    "connection closed before CONNECT".into(),
                )
                .into());
            }
            Ok(Err(e)) => return Err(TriviumError::Transport(e)),
            Err(_) => {
                let _ = conn.close().await;
                return Err(ProtocolError::InvalidMessage(
                    "CONNECT timed out".into(),
                )
                .into());
            }
        };

    let message: ClientMessage = match state.codec.decode(&data) {
        Ok(msg) => msg,
        Err(e) => {
            send_error(conn, &state.codec, "expected CONNECT").await;
            let _ = conn.close().await;
            return Err(e.into());
        }
    };

    match message {
        ClientMessage::Connect { room_code, player_id, session_token } => {
            Ok((room_code, player_id, session_token))
        }
        _ => {
            send_error(conn, &state.codec, "first message must be CONNECT")
                .await;
            let _ = conn.close().await;
            Err(ProtocolError::InvalidMessage(
                "first message must be CONNECT".into(),
            )
            .into())
        }
    }
}

/// Sends a `ServerMessage::Error` to this connection only.
async fn send_error(conn: &WebSocketConnection, codec: &JsonCodec, message: &str) {
    let msg = ServerMessage::Error { message: message.to_string() };
    if let Ok(bytes) = codec.encode(&msg) {
        let _ = conn.send(&bytes).await;
    }
}
