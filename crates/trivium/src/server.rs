//! `TriviumServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room. The builder
//! takes the two external collaborators (question source and answer
//! oracle); everything else is wired here — timer service, its
//! dispatcher task, and the room store.

use std::sync::Arc;

use tokio::sync::mpsc;
use trivium_game::{
    AnswerOracle, GameTimings, NormalizingOracle, QuestionSource,
};
use trivium_protocol::JsonCodec;
use trivium_room::{RoomStore, run_timer_dispatcher};
use trivium_timer::{TimerFired, TimerService};
use trivium_transport::{Transport, WebSocketTransport};

use crate::TriviumError;
use crate::handler::handle_connection;
use crate::registration::RegistrationService;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) store: Arc<RoomStore>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Trivium server.
///
/// # Example
///
/// ```rust,ignore
/// let server = TriviumServer::builder()
///     .bind("0.0.0.0:8080")
///     .question_source(my_source)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TriviumServerBuilder {
    bind_addr: String,
    timings: GameTimings,
    source: Option<Arc<dyn QuestionSource>>,
    oracle: Arc<dyn AnswerOracle>,
}

impl TriviumServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            timings: GameTimings::default(),
            source: None,
            oracle: Arc::new(NormalizingOracle),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the question source (required).
    pub fn question_source(mut self, source: Arc<dyn QuestionSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Replaces the default [`NormalizingOracle`].
    pub fn answer_oracle(mut self, oracle: Arc<dyn AnswerOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Overrides the phase durations. Mostly for tests.
    pub fn timings(mut self, timings: GameTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Binds the transport and assembles the server.
    ///
    /// # Panics
    /// Panics if no question source was provided — that's a wiring
    /// bug, not a runtime condition.
    pub async fn build(self) -> Result<TriviumServer, TriviumError> {
        let source = self.source.expect("a question source must be configured");
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let (timers, fired) = TimerService::new();
        let store = Arc::new(RoomStore::new(
            source,
            self.oracle,
            self.timings,
            timers,
        ));
        spawn_dispatcher(Arc::clone(&store), fired);

        let state = Arc::new(ServerState { store, codec: JsonCodec });
        Ok(TriviumServer { transport, state })
    }
}

impl Default for TriviumServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_dispatcher(
    store: Arc<RoomStore>,
    fired: mpsc::UnboundedReceiver<TimerFired>,
) {
    tokio::spawn(run_timer_dispatcher(store, fired));
}

/// A running Trivium server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TriviumServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl TriviumServer {
    pub fn builder() -> TriviumServerBuilder {
        TriviumServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(
        &self,
    ) -> Result<std::net::SocketAddr, TriviumError> {
        Ok(self.transport.local_addr()?)
    }

    /// The pre-registration surface, for an HTTP front (or tests) to
    /// create rooms and reserve player slots.
    pub fn registration(&self) -> RegistrationService {
        RegistrationService::new(Arc::clone(&self.state.store))
    }

    /// Runs the accept loop: one handler task per connection, until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), TriviumError> {
        tracing::info!("Trivium server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
