//! Board engine for Dropfour.
//!
//! A pure, deterministic 6×7 gravity-drop board: markers fall to the
//! lowest empty cell of a column, and four in a row on any axis wins.
//! No I/O, no clocks, no randomness, so two replicas fed the same columns
//! in the same order always hold identical boards.
//!
//! Coordinates are 0-indexed with row 0 at the top; markers fill from
//! row [`ROWS`]` - 1` upward.

mod board;
mod error;

pub use board::{Board, COLS, Placement, Player, ROWS, WIN_LENGTH};
pub use error::PlaceError;
