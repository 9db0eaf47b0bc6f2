//! Frames spoken between a relay server and its clients.
//!
//! The relay is a dumb fan-out for the substrate seam: it knows channels
//! and peers, never games. Payloads inside `Send`/`Action` are opaque
//! bytes produced by a [`WireMessage`](crate::WireMessage).

use dropfour_transport::{ChannelId, PeerId};
use serde::{Deserialize, Serialize};

/// Client → relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Enter a channel.
    Join { channel: ChannelId },
    /// Leave a channel.
    Leave { channel: ChannelId },
    /// Deliver an action to the channel, or only to `target`.
    Send {
        channel: ChannelId,
        action: String,
        payload: Vec<u8>,
        target: Option<PeerId>,
    },
}

/// Relay → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayFrame {
    /// First frame on every connection: the peer id the relay assigned.
    Welcome { peer: PeerId },
    /// `peer` is present in `channel`.
    PeerJoined { channel: ChannelId, peer: PeerId },
    /// `peer` left `channel`.
    PeerLeft { channel: ChannelId, peer: PeerId },
    /// An action from `from` in `channel`.
    Action {
        channel: ChannelId,
        action: String,
        payload: Vec<u8>,
        from: PeerId,
    },
    /// The relay refused a client frame.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_frame_join_json_format() {
        let frame = ClientFrame::Join {
            channel: ChannelId::new("app/lobby"),
        };
        let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "Join");
        assert_eq!(json["channel"], "app/lobby");
    }

    #[test]
    fn test_client_frame_send_without_target_is_null() {
        let frame = ClientFrame::Send {
            channel: ChannelId::new("c"),
            action: "move".into(),
            payload: vec![1, 2],
            target: None,
        };
        let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "Send");
        assert!(json["target"].is_null());
        assert_eq!(json["payload"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_relay_frame_welcome_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(RelayFrame::Welcome { peer: PeerId(4) }).unwrap();
        assert_eq!(json["type"], "Welcome");
        assert_eq!(json["peer"], 4);
    }

    #[test]
    fn test_relay_frame_unknown_type_is_error() {
        let result: Result<RelayFrame, _> = serde_json::from_str(r#"{"type":"Teleport"}"#);
        assert!(result.is_err());
    }
}
