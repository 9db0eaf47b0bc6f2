//! Error types for the relay.

use dropfour_protocol::ProtocolError;
use dropfour_transport::{ChannelId, PeerId, TransportError};

/// Errors from the relay server and the relay client.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The underlying WebSocket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The relay did not open the connection with a `Welcome` frame.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A peer tried to join a channel it is already in.
    #[error("{peer} already joined {channel}")]
    AlreadyJoined { channel: ChannelId, peer: PeerId },

    /// A peer tried to use a channel it is not in.
    #[error("{peer} is not in {channel}")]
    NotJoined { channel: ChannelId, peer: PeerId },
}
