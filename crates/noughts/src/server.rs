//! `NoughtsServer` builder and server loop.
//!
//! This is the entry point for running a Noughts server. It ties together
//! all the layers: transport → protocol → room registry.

use std::net::SocketAddr;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use noughts_protocol::{Codec, JsonCodec};
use noughts_room::RoomRegistry;
use noughts_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{NoughtsError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    /// Locks itself per lookup; moves and resets go straight to the room
    /// actor.
    pub(crate) rooms: RoomRegistry,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a Noughts server.
///
/// # Example
///
/// ```rust,no_run
/// use noughts::prelude::*;
///
/// # async fn start() -> Result<(), NoughtsError> {
/// let server = NoughtsServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NoughtsServerBuilder {
    bind_addr: String,
    idle_timeout: Option<Duration>,
    registry: Option<RoomRegistry>,
}

impl NoughtsServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            idle_timeout: defaults.idle_timeout,
            registry: None,
        }
    }

    /// Takes bind address and idle timeout from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new()
            .bind(&config.bind_address())
            .idle_timeout(config.idle_timeout)
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Closes connections that send nothing for `timeout`. `None` keeps
    /// idle connections open forever.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Uses a pre-built registry, e.g. one with a custom id generator.
    pub fn registry(mut self, registry: RoomRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<NoughtsServer<JsonCodec>, NoughtsError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: self.registry.unwrap_or_default(),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(NoughtsServer { transport, state })
    }
}

impl Default for NoughtsServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Noughts server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct NoughtsServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl NoughtsServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> NoughtsServerBuilder {
        NoughtsServerBuilder::new()
    }
}

impl<C: Codec> NoughtsServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each connection. Runs until the process
    /// is terminated.
    pub async fn run(self) -> Result<(), NoughtsError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops
    /// listening and returns.
    ///
    /// Connections already accepted keep running until their clients
    /// leave.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), NoughtsError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Noughts server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.transport.shutdown().await?;
        tracing::info!(rooms = self.state.rooms.room_count(), "Noughts server stopped");
        Ok(())
    }
}
