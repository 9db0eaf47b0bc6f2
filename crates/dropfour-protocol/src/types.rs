//! Payloads exchanged between peers.
//!
//! On the substrate every message is a pair: an action name and a small
//! payload. The two families here map one-to-one onto the two channels a
//! participant uses:
//!
//! - [`LobbyMessage`] travels on the shared discovery channel.
//! - [`SessionMessage`] travels on the private two-party session channel.
//!
//! Payload shapes are fixed and unversioned:
//!
//! ```text
//! seeking   {"token": "<32 hex>"}
//! accept    {"sessionId": "<32 hex>"}
//! move      {"column": 3}
//! surrender {}
//! rematch   {}
//! quit      {}
//! ```

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Codec, ProtocolError};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Generates a random 32-character hex string (128 bits of entropy).
///
/// `rand::rng()` is a CSPRNG, so two peers producing the same value is
/// not a case worth handling.
fn random_hex() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// A single-use matchmaking token.
///
/// Regenerated for every matchmaking attempt and compared only to elect a
/// host. The derived `Ord` is lexicographic on the hex string, which for
/// fixed-width lowercase hex is the same as numeric order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchToken(String);

impl MatchToken {
    /// Generates a fresh random token.
    pub fn generate() -> Self {
        Self(random_hex())
    }

    /// Wraps a known value. Used by tests that need a fixed order.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The token as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a private two-party session, chosen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random session id.
    pub fn generate() -> Self {
        Self(random_hex())
    }

    /// Wraps a known value.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Payload bodies
// ---------------------------------------------------------------------------

/// Body of a `seeking` announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekingPayload {
    pub token: MatchToken,
}

/// Body of an `accept` reply, addressed to the elected guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptPayload {
    pub session_id: SessionId,
}

/// Body of a `move`. The column only; the receiver derives row and player
/// from its own board replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePayload {
    pub column: usize,
}

/// Body of the signal-only actions (`surrender`, `rematch`, `quit`).
/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmptyPayload {}

// ---------------------------------------------------------------------------
// Message families
// ---------------------------------------------------------------------------

/// A message family that maps onto substrate `(action, payload)` pairs.
pub trait WireMessage: Sized {
    /// The substrate action name for this message.
    fn action(&self) -> &'static str;

    /// Encodes the payload body.
    fn encode_payload<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError>;

    /// Rebuilds a message from an action name and payload body.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownAction`] for an action outside this family,
    /// `Decode` for a malformed body.
    fn decode_action<C: Codec>(
        codec: &C,
        action: &str,
        payload: &[u8],
    ) -> Result<Self, ProtocolError>;
}

/// Traffic on the shared discovery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyMessage {
    /// "I am looking for an opponent; here is my token for this attempt."
    Seeking { token: MatchToken },
    /// "I won the election; meet me in this session."
    Accept { session_id: SessionId },
}

impl LobbyMessage {
    pub const SEEKING: &'static str = "seeking";
    pub const ACCEPT: &'static str = "accept";
}

impl WireMessage for LobbyMessage {
    fn action(&self) -> &'static str {
        match self {
            Self::Seeking { .. } => Self::SEEKING,
            Self::Accept { .. } => Self::ACCEPT,
        }
    }

    fn encode_payload<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Seeking { token } => codec.encode(&SeekingPayload {
                token: token.clone(),
            }),
            Self::Accept { session_id } => codec.encode(&AcceptPayload {
                session_id: session_id.clone(),
            }),
        }
    }

    fn decode_action<C: Codec>(
        codec: &C,
        action: &str,
        payload: &[u8],
    ) -> Result<Self, ProtocolError> {
        match action {
            Self::SEEKING => {
                let body: SeekingPayload = codec.decode(payload)?;
                Ok(Self::Seeking { token: body.token })
            }
            Self::ACCEPT => {
                let body: AcceptPayload = codec.decode(payload)?;
                Ok(Self::Accept {
                    session_id: body.session_id,
                })
            }
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }
}

/// Traffic on a private session channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMessage {
    Move { column: usize },
    Surrender,
    RematchVote,
    Quit,
}

impl SessionMessage {
    pub const MOVE: &'static str = "move";
    pub const SURRENDER: &'static str = "surrender";
    pub const REMATCH: &'static str = "rematch";
    pub const QUIT: &'static str = "quit";
}

impl WireMessage for SessionMessage {
    fn action(&self) -> &'static str {
        match self {
            Self::Move { .. } => Self::MOVE,
            Self::Surrender => Self::SURRENDER,
            Self::RematchVote => Self::REMATCH,
            Self::Quit => Self::QUIT,
        }
    }

    fn encode_payload<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Move { column } => codec.encode(&MovePayload { column: *column }),
            Self::Surrender | Self::RematchVote | Self::Quit => codec.encode(&EmptyPayload {}),
        }
    }

    fn decode_action<C: Codec>(
        codec: &C,
        action: &str,
        payload: &[u8],
    ) -> Result<Self, ProtocolError> {
        match action {
            Self::MOVE => {
                let body: MovePayload = codec.decode(payload)?;
                Ok(Self::Move {
                    column: body.column,
                })
            }
            Self::SURRENDER => {
                codec.decode::<EmptyPayload>(payload)?;
                Ok(Self::Surrender)
            }
            Self::REMATCH => {
                codec.decode::<EmptyPayload>(payload)?;
                Ok(Self::RematchVote)
            }
            Self::QUIT => {
                codec.decode::<EmptyPayload>(payload)?;
                Ok(Self::Quit)
            }
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonCodec;

    // =====================================================================
    // Identifiers
    // =====================================================================

    #[test]
    fn test_match_token_generate_is_32_hex_chars() {
        let token = MatchToken::generate();
        assert_eq!(token.as_str().len(), 32);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_match_token_generate_is_fresh_each_time() {
        assert_ne!(MatchToken::generate(), MatchToken::generate());
    }

    #[test]
    fn test_match_token_orders_lexicographically() {
        let low = MatchToken::from_raw("0fffffffffffffffffffffffffffffff");
        let high = MatchToken::from_raw("f0000000000000000000000000000000");
        assert!(high > low);
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionId::from_raw("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    // =====================================================================
    // Payload shapes
    // =====================================================================

    #[test]
    fn test_seeking_payload_json_shape() {
        let msg = LobbyMessage::Seeking {
            token: MatchToken::from_raw("aa"),
        };
        let bytes = msg.encode_payload(&JsonCodec).unwrap();
        assert_eq!(bytes, br#"{"token":"aa"}"#);
        assert_eq!(msg.action(), "seeking");
    }

    #[test]
    fn test_accept_payload_uses_camel_case_session_id() {
        let msg = LobbyMessage::Accept {
            session_id: SessionId::from_raw("s1"),
        };
        let json: serde_json::Value =
            serde_json::from_slice(&msg.encode_payload(&JsonCodec).unwrap()).unwrap();
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(msg.action(), "accept");
    }

    #[test]
    fn test_signal_payloads_are_empty_objects() {
        for msg in [
            SessionMessage::Surrender,
            SessionMessage::RematchVote,
            SessionMessage::Quit,
        ] {
            assert_eq!(msg.encode_payload(&JsonCodec).unwrap(), b"{}");
        }
    }

    #[test]
    fn test_session_message_action_names() {
        assert_eq!(SessionMessage::Move { column: 0 }.action(), "move");
        assert_eq!(SessionMessage::Surrender.action(), "surrender");
        assert_eq!(SessionMessage::RematchVote.action(), "rematch");
        assert_eq!(SessionMessage::Quit.action(), "quit");
    }

    // =====================================================================
    // Decoding
    // =====================================================================

    #[test]
    fn test_decode_move_reads_column() {
        let msg = SessionMessage::decode_action(&JsonCodec, "move", br#"{"column":6}"#).unwrap();
        assert_eq!(msg, SessionMessage::Move { column: 6 });
    }

    #[test]
    fn test_decode_signal_ignores_extra_fields() {
        let msg = SessionMessage::decode_action(&JsonCodec, "quit", br#"{"why":"bored"}"#).unwrap();
        assert_eq!(msg, SessionMessage::Quit);
    }

    #[test]
    fn test_decode_negative_column_is_error() {
        let result = SessionMessage::decode_action(&JsonCodec, "move", br#"{"column":-1}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_unknown_action_is_error() {
        let result = SessionMessage::decode_action(&JsonCodec, "seeking", b"{}");
        assert!(matches!(result, Err(ProtocolError::UnknownAction(a)) if a == "seeking"));
    }

    #[test]
    fn test_decode_lobby_accept_reads_session_id() {
        let msg =
            LobbyMessage::decode_action(&JsonCodec, "accept", br#"{"sessionId":"xyz"}"#).unwrap();
        assert_eq!(
            msg,
            LobbyMessage::Accept {
                session_id: SessionId::from_raw("xyz")
            }
        );
    }

    #[test]
    fn test_decode_lobby_garbage_is_error() {
        let result = LobbyMessage::decode_action(&JsonCodec, "seeking", b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
