//! Error types for the session layer.

use dropfour_board::PlaceError;
use dropfour_protocol::ProtocolError;
use dropfour_transport::TransportError;

use crate::Phase;

/// Errors from local session operations.
///
/// Every variant except `Transport` and `Protocol` is a rejected local
/// action: the state is left exactly as it was and nothing was sent.
/// Stale remote messages never show up here; they are dropped.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a session, but we are in the lobby.
    #[error("not in a session")]
    NotInSession,

    /// A session is already running.
    #[error("already in a session")]
    AlreadyInSession,

    /// Moves and surrender are only valid while a game is in progress.
    #[error("no game in progress (session is {0})")]
    NotPlaying(Phase),

    /// The opponent's marker is on turn.
    #[error("it is not your turn")]
    NotYourTurn,

    /// The board refused the placement.
    #[error(transparent)]
    Rejected(#[from] PlaceError),

    /// Rematch votes are only taken once the game has ended.
    #[error("the game is still in progress")]
    GameNotOver,

    /// We already voted for a rematch of this game.
    #[error("already voted for a rematch")]
    AlreadyVoted,

    /// Sending on the session channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
