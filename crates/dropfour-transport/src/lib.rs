//! Transport abstraction layer for Dropfour.
//!
//! Two seams live here:
//!
//! - [`Substrate`] and [`Channel`]: the peer-discovery substrate the
//!   matchmaking and session layers are written against. A substrate lets
//!   a participant join named channels, see who else is present, and
//!   exchange small named actions with them, either broadcast or addressed
//!   to one peer.
//! - [`Transport`] and [`Connection`]: raw byte pipes used by the relay
//!   server and its client to carry substrate traffic between processes.
//!
//! # Feature Flags
//!
//! - `memory` (default): in-process substrate ([`MemoryNetwork`])
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "memory")]
pub use memory::{MemoryChannel, MemoryNetwork, MemoryPeer};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Identifier of a participant as seen by the substrate.
///
/// A peer keeps the same id across every channel it joins through one
/// substrate handle, so the peer seen in the lobby is recognisable in the
/// private session channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Name of a channel (a "room" in substrate terms).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Creates a channel id from a raw name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a channel id scoped to one application, so unrelated apps
    /// sharing a substrate never meet: `"{app_id}/{name}"`.
    pub fn namespaced(app_id: &str, name: &str) -> Self {
        Self(format!("{app_id}/{name}"))
    }

    /// Returns the channel name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Substrate seam
// ---------------------------------------------------------------------------

/// Something that happened in a joined channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A peer is present in the channel. Fired for every peer already
    /// present at join time, and for every peer that joins later.
    PeerJoined(PeerId),

    /// A peer left the channel, voluntarily or because its connection died.
    PeerLeft(PeerId),

    /// A named action from another peer.
    Action {
        name: String,
        payload: Vec<u8>,
        from: PeerId,
    },
}

/// The single-consumer stream of events for one joined channel.
///
/// Returns `None` once the substrate behind it is gone.
pub type ChannelEvents = mpsc::UnboundedReceiver<ChannelEvent>;

/// Joins channels on a peer-discovery substrate.
///
/// Delivery is best-effort. Actions from one sender arrive in the order
/// they were sent; nothing is promised about ordering across senders.
pub trait Substrate: Send + Sync + 'static {
    /// The channel handle produced by this substrate.
    type Channel: Channel;

    /// Joins a channel, returning a handle for outbound traffic and the
    /// stream of inbound events.
    async fn join(
        &self,
        channel: &ChannelId,
    ) -> Result<(Self::Channel, ChannelEvents), TransportError>;
}

/// A joined channel: outbound half.
pub trait Channel: Send + Sync + 'static {
    /// Sends a named action to every other member, or only to `target`.
    ///
    /// Sending to a target that is not present is silently dropped.
    async fn broadcast(
        &self,
        action: &str,
        payload: &[u8],
        target: Option<PeerId>,
    ) -> Result<(), TransportError>;

    /// Leaves the channel. Remaining members observe `PeerLeft`.
    /// Leaving twice is a no-op.
    async fn leave(&self) -> Result<(), TransportError>;

    /// The channel this handle belongs to.
    fn id(&self) -> &ChannelId;

    /// The local peer's id in this channel.
    fn local_peer(&self) -> PeerId;
}

// ---------------------------------------------------------------------------
// Byte transport seam
// ---------------------------------------------------------------------------

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive bytes.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote end.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote end.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
        assert_eq!(id.to_string(), "conn-42");
    }

    #[test]
    fn test_peer_id_display_and_order() {
        assert_eq!(PeerId(7).to_string(), "peer-7");
        assert!(PeerId(1) < PeerId(2));
    }

    #[test]
    fn test_peer_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PeerId(9)).unwrap();
        assert_eq!(json, "9");
    }

    #[test]
    fn test_channel_id_namespaced_joins_with_slash() {
        let id = ChannelId::namespaced("dropfour", "lobby");
        assert_eq!(id.as_str(), "dropfour/lobby");
        assert_eq!(id.to_string(), "dropfour/lobby");
    }

    #[test]
    fn test_channel_id_namespaced_differs_per_app() {
        assert_ne!(
            ChannelId::namespaced("a", "lobby"),
            ChannelId::namespaced("b", "lobby")
        );
    }
}
