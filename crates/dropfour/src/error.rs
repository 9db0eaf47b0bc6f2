//! Unified error type for Dropfour.

use dropfour_board::PlaceError;
use dropfour_matchmaking::MatchmakingError;
use dropfour_protocol::ProtocolError;
use dropfour_relay::RelayError;
use dropfour_session::SessionError;
use dropfour_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `dropfour` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DropfourError {
    /// A transport-level error (join, leave, send).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown action).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The board refused a placement.
    #[error(transparent)]
    Place(#[from] PlaceError),

    /// A matchmaking attempt failed.
    #[error(transparent)]
    Matchmaking(#[from] MatchmakingError),

    /// A session operation was rejected or could not be sent.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Talking to the relay failed.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let dropfour_err: DropfourError = err.into();
        assert!(matches!(dropfour_err, DropfourError::Transport(_)));
        assert!(dropfour_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownAction("dance".into());
        let dropfour_err: DropfourError = err.into();
        assert!(matches!(dropfour_err, DropfourError::Protocol(_)));
    }

    #[test]
    fn test_from_place_error() {
        let err = PlaceError::ColumnFull(3);
        let dropfour_err: DropfourError = err.into();
        assert!(matches!(dropfour_err, DropfourError::Place(_)));
        assert_eq!(dropfour_err.to_string(), "column 3 is full");
    }

    #[test]
    fn test_from_matchmaking_error() {
        let dropfour_err: DropfourError = MatchmakingError::LobbyClosed.into();
        assert!(matches!(dropfour_err, DropfourError::Matchmaking(_)));
    }

    #[test]
    fn test_from_session_error() {
        let dropfour_err: DropfourError = SessionError::NotYourTurn.into();
        assert!(matches!(dropfour_err, DropfourError::Session(_)));
        assert_eq!(dropfour_err.to_string(), "it is not your turn");
    }

    #[test]
    fn test_from_relay_error() {
        let err = RelayError::Handshake("no welcome".into());
        let dropfour_err: DropfourError = err.into();
        assert!(matches!(dropfour_err, DropfourError::Relay(_)));
        assert!(dropfour_err.to_string().contains("no welcome"));
    }
}
