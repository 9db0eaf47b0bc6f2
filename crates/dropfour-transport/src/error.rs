use crate::ChannelId;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Establishing an outbound connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A frame could not be encoded or decoded on its way through a relay.
    #[error("bad frame: {0}")]
    BadFrame(String),

    /// The local peer is already a member of this channel.
    #[error("already joined channel {0}")]
    AlreadyJoined(ChannelId),

    /// The local peer is not (or no longer) a member of this channel.
    #[error("not a member of channel {0}")]
    NotJoined(ChannelId),
}
