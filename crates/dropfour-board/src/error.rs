//! Error types for the board engine.

/// Why a placement was rejected.
///
/// A rejection never changes the board, the turn, or the outcome. Callers
/// treat it as a no-op: nothing is relayed to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    /// The game on this board is already decided.
    #[error("game is already over")]
    GameOver,

    /// The column index is outside the board.
    #[error("column {0} is out of range")]
    ColumnOutOfRange(usize),

    /// The column has no empty cell left.
    #[error("column {0} is full")]
    ColumnFull(usize),
}
