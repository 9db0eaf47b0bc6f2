//! Error types for the matchmaking layer.

use dropfour_protocol::{ProtocolError, SessionId};
use dropfour_transport::{PeerId, TransportError};

/// Errors that end a matchmaking attempt.
///
/// Malformed lobby traffic from strangers is not among them: it is logged
/// and skipped, and the attempt keeps seeking.
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    /// Joining, leaving, or sending on a channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Our own announcement could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The discovery channel's event stream ended while seeking.
    #[error("discovery channel closed while seeking")]
    LobbyClosed,

    /// We were paired, but the counterpart never showed up in the private
    /// channel before the wait timed out.
    #[error("peer {peer} never arrived in session {session_id}")]
    PeerNeverArrived { session_id: SessionId, peer: PeerId },
}
