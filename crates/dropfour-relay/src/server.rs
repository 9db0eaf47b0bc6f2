//! `RelayServer` builder and accept loop.
//!
//! Ties the WebSocket transport to the channel hub: every accepted
//! connection gets a fresh peer id and its own handler task.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dropfour_protocol::{Codec, JsonCodec};
use dropfour_transport::{PeerId, Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::RelayError;
use crate::handler::handle_connection;
use crate::hub::Hub;

/// Address the relay binds to when none is given.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:9400";

/// Shared relay state passed to each connection handler task.
pub(crate) struct RelayState<C: Codec> {
    pub(crate) hub: Mutex<Hub>,
    pub(crate) codec: C,
    next_peer: AtomicU64,
}

impl<C: Codec> RelayState<C> {
    pub(crate) fn next_peer(&self) -> PeerId {
        PeerId(self.next_peer.fetch_add(1, Ordering::Relaxed))
    }
}

/// Builder for configuring and starting a relay.
///
/// # Example
///
/// ```rust,no_run
/// use dropfour_relay::RelayServer;
///
/// # async fn run() -> Result<(), dropfour_relay::RelayError> {
/// let server = RelayServer::builder().bind("0.0.0.0:9400").build().await?;
/// server.run().await
/// # }
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener. Frames are JSON.
    pub async fn build(self) -> Result<RelayServer<JsonCodec>, RelayError> {
        self.build_with_codec(JsonCodec).await
    }

    /// Binds the listener with an explicit frame codec.
    pub async fn build_with_codec<C: Codec>(self, codec: C) -> Result<RelayServer<C>, RelayError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(RelayState {
            hub: Mutex::new(Hub::new()),
            codec,
            next_peer: AtomicU64::new(1),
        });
        Ok(RelayServer { transport, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound relay. Call [`run()`](Self::run) to start accepting.
pub struct RelayServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<RelayState<C>>,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }
}

impl<C: Codec> RelayServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!("relay running");

        loop {
            match self.transport.accept().await {
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
            }
        }
    }
}
