//! Error types for the protocol layer.
//!
//! Each crate in Dropfour defines its own error enum. A `ProtocolError`
//! always means a payload could not be turned into (or out of) bytes,
//! never that the network or the game misbehaved.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// or a negative column from a misbehaving peer.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The action name is not one this message family understands.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
