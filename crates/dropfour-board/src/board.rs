//! The board, its players, and win detection.

use std::fmt;

use crate::PlaceError;

/// Number of rows on the board.
pub const ROWS: usize = 6;
/// Number of columns on the board.
pub const COLS: usize = 7;
/// Run length that wins.
pub const WIN_LENGTH: usize = 4;

/// The four axes a run can lie on, as (row step, column step). Each axis
/// is walked in both directions from the placed cell.
const AXES: [(isize, isize); 4] = [
    (0, 1),  // horizontal
    (1, 0),  // vertical
    (1, 1),  // diagonal \
    (1, -1), // diagonal /
];

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One of the two markers. `One` always opens a fresh board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The opponent.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// `1` or `2`.
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    fn symbol(self) -> char {
        match self {
            Self::One => 'X',
            Self::Two => 'O',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.number())
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// The effect of an accepted placement: where the marker landed and whose
/// it is. This is what gets shown to the user and what the peer's replica
/// must reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub column: usize,
    pub player: Player,
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A 6×7 board with the player on turn and the winner, if any.
///
/// Mutated only through [`place`](Self::place) and [`reset`](Self::reset).
/// Within every column the occupied cells are contiguous from the bottom
/// row up, and a cell never empties except through `reset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Player>; COLS]; ROWS],
    turn: Player,
    winner: Option<Player>,
}

impl Board {
    /// Creates an empty board with player one on turn.
    pub fn new() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
            turn: Player::One,
            winner: None,
        }
    }

    /// Drops the current player's marker into `column`.
    ///
    /// On success the marker sits in the lowest empty cell of the column.
    /// If it completes a run of [`WIN_LENGTH`] the current player becomes
    /// the winner and the turn stays put; otherwise the turn passes.
    ///
    /// # Errors
    /// Rejected, with the board untouched, when the game is already won,
    /// the column is out of range, or the column is full.
    pub fn place(&mut self, column: usize) -> Result<Placement, PlaceError> {
        if self.winner.is_some() {
            return Err(PlaceError::GameOver);
        }
        if column >= COLS {
            return Err(PlaceError::ColumnOutOfRange(column));
        }
        let row = (0..ROWS)
            .rev()
            .find(|&row| self.cells[row][column].is_none())
            .ok_or(PlaceError::ColumnFull(column))?;

        let player = self.turn;
        self.cells[row][column] = Some(player);

        if self.win_check_around(row, column) {
            self.winner = Some(player);
        } else {
            self.turn = player.other();
        }

        Ok(Placement {
            row,
            column,
            player,
        })
    }

    /// Returns `true` if the marker at (`row`, `column`) is part of a run
    /// of at least [`WIN_LENGTH`] on any axis.
    ///
    /// Only the cells reachable from that one marker are inspected, never
    /// the whole board. An empty or out-of-range cell is never a win.
    pub fn win_check_around(&self, row: usize, column: usize) -> bool {
        let Some(player) = self.cell(row, column) else {
            return false;
        };

        AXES.iter().any(|&(dr, dc)| {
            let run = 1
                + self.run_length(row, column, dr, dc, player)
                + self.run_length(row, column, -dr, -dc, player);
            run >= WIN_LENGTH
        })
    }

    /// Counts consecutive `player` markers stepping away from (row, column),
    /// not counting the start cell. Stops at the edge, at a different cell,
    /// or once a winning run is already guaranteed.
    fn run_length(&self, row: usize, column: usize, dr: isize, dc: isize, player: Player) -> usize {
        (1..WIN_LENGTH)
            .map_while(|step| {
                let r = row.checked_add_signed(dr * step as isize)?;
                let c = column.checked_add_signed(dc * step as isize)?;
                (self.cell(r, c)? == player).then_some(())
            })
            .count()
    }

    /// Clears every cell, puts player one on turn, and clears the winner.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The marker at (`row`, `column`), or `None` for an empty or
    /// out-of-range cell.
    pub fn cell(&self, row: usize, column: usize) -> Option<Player> {
        self.cells.get(row)?.get(column).copied().flatten()
    }

    /// The player whose marker the next placement drops.
    ///
    /// Meaningless once [`winner`](Self::winner) is set.
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// The winner, once someone has completed a run.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Returns `true` if `column` cannot take another marker. Out-of-range
    /// columns count as full.
    pub fn is_column_full(&self, column: usize) -> bool {
        column >= COLS || self.cells[0][column].is_some()
    }

    /// Returns `true` once every column is full.
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|column| self.is_column_full(column))
    }

    /// Number of markers on the board.
    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_some()).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Text rendering, top row first, with column numbers underneath.
///
/// ```text
/// . . . . . . .
/// . . . X . . .
/// . . O X . . .
/// 0 1 2 3 4 5 6
/// ```
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row
                .iter()
                .map(|cell| cell.map_or('.', Player::symbol).to_string())
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        let footer: Vec<String> = (0..COLS).map(|c| c.to_string()).collect();
        write!(f, "{}", footer.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plays `columns` in order, panicking on any rejection.
    fn play(columns: &[usize]) -> Board {
        let mut board = Board::new();
        for &column in columns {
            board
                .place(column)
                .unwrap_or_else(|e| panic!("column {column} rejected: {e}"));
        }
        board
    }

    /// Asserts the gravity invariant: no empty cell below an occupied one.
    fn assert_gravity(board: &Board) {
        for column in 0..COLS {
            let mut seen_empty = false;
            for row in (0..ROWS).rev() {
                match board.cell(row, column) {
                    None => seen_empty = true,
                    Some(_) => assert!(!seen_empty, "floating marker at ({row}, {column})"),
                }
            }
        }
    }

    // =====================================================================
    // place()
    // =====================================================================

    #[test]
    fn test_place_lands_on_bottom_row() {
        let mut board = Board::new();

        let placement = board.place(3).unwrap();

        assert_eq!(
            placement,
            Placement {
                row: ROWS - 1,
                column: 3,
                player: Player::One
            }
        );
        assert_eq!(board.cell(ROWS - 1, 3), Some(Player::One));
        assert_eq!(board.turn(), Player::Two);
    }

    #[test]
    fn test_place_stacks_upward_and_alternates() {
        let mut board = Board::new();

        let first = board.place(2).unwrap();
        let second = board.place(2).unwrap();

        assert_eq!((first.row, first.player), (5, Player::One));
        assert_eq!((second.row, second.player), (4, Player::Two));
        assert_eq!(board.turn(), Player::One);
        assert_gravity(&board);
    }

    #[test]
    fn test_place_full_column_is_rejected_without_mutation() {
        let mut board = play(&[0, 0, 0, 0, 0, 0]);
        let before = board.clone();

        let result = board.place(0);

        assert_eq!(result, Err(PlaceError::ColumnFull(0)));
        assert_eq!(board, before, "rejection must not touch board, turn or outcome");
    }

    #[test]
    fn test_place_out_of_range_is_rejected() {
        let mut board = Board::new();

        assert_eq!(board.place(COLS), Err(PlaceError::ColumnOutOfRange(COLS)));
        assert_eq!(board.place(usize::MAX), Err(PlaceError::ColumnOutOfRange(usize::MAX)));
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_place_after_win_is_rejected() {
        let mut board = play(&[3, 3, 2, 2, 1, 1, 0]);
        let before = board.clone();

        assert_eq!(board.place(6), Err(PlaceError::GameOver));
        assert_eq!(board, before);
    }

    // =====================================================================
    // Win detection
    // =====================================================================

    #[test]
    fn test_horizontal_win_on_bottom_row() {
        // 3,3,2,2,1,1,0 for players 1,2,1,2,1,2,1.
        let mut board = play(&[3, 3, 2, 2, 1, 1]);
        assert_eq!(board.winner(), None);

        let last = board.place(0).unwrap();

        assert_eq!(last, Placement { row: 5, column: 0, player: Player::One });
        assert_eq!(board.winner(), Some(Player::One));
        assert_eq!(board.turn(), Player::One, "turn stays with the winner");
        for column in 0..4 {
            assert_eq!(board.cell(5, column), Some(Player::One));
        }
    }

    #[test]
    fn test_vertical_win() {
        let board = play(&[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(board.winner(), Some(Player::One));
    }

    #[test]
    fn test_diagonal_rising_win() {
        // X on (5,0) (4,1) (3,2) (2,3)
        let board = play(&[0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3]);
        assert_eq!(board.winner(), Some(Player::One));
        assert!(board.win_check_around(2, 3));
    }

    #[test]
    fn test_diagonal_falling_win_completed_from_middle() {
        // O builds (2,0) (3,1) (4,2) (5,3); the last O lands at (3,1),
        // inside the run, so both directions of the axis are counted.
        let board = play(&[0, 3, 2, 2, 0, 0, 1, 0, 1, 6, 6, 1]);
        assert_eq!(board.cell(2, 0), Some(Player::Two));
        assert_eq!(board.cell(3, 1), Some(Player::Two));
        assert_eq!(board.cell(4, 2), Some(Player::Two));
        assert_eq!(board.cell(5, 3), Some(Player::Two));
        assert_eq!(board.winner(), Some(Player::Two));
    }

    #[test]
    fn test_three_in_a_row_is_not_a_win() {
        let board = play(&[0, 0, 1, 1, 2, 2]);
        assert_eq!(board.winner(), None);
        assert!(!board.win_check_around(5, 2));
    }

    #[test]
    fn test_run_broken_by_opponent_is_not_a_win() {
        // X X O X on the bottom row.
        let board = play(&[0, 2, 1, 6, 3, 6]);
        assert_eq!(board.winner(), None);
        assert!(!board.win_check_around(5, 3));
    }

    #[test]
    fn test_win_check_around_empty_cell_is_false() {
        let board = Board::new();
        assert!(!board.win_check_around(0, 0));
        assert!(!board.win_check_around(ROWS, COLS));
    }

    // =====================================================================
    // reset() and accessors
    // =====================================================================

    #[test]
    fn test_reset_clears_everything() {
        let mut board = play(&[3, 3, 2, 2, 1, 1, 0]);

        board.reset();

        assert_eq!(board, Board::new());
        assert_eq!(board.turn(), Player::One);
        assert_eq!(board.winner(), None);
        assert_eq!(board.occupied(), 0);
    }

    #[test]
    fn test_is_full_after_filling_without_winner() {
        // Column pairs filled in an order that never lines up four.
        let order = [
            0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, //
            2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, //
            4, 5, 4, 5, 4, 5, 5, 4, 5, 4, 5, 4, //
            6, 6, 6, 6, 6, 6,
        ];
        let board = play(&order);

        assert_eq!(board.winner(), None);
        assert!(board.is_full());
        assert_eq!(board.occupied(), ROWS * COLS);
        assert_gravity(&board);
    }

    #[test]
    fn test_display_renders_markers_and_footer() {
        let board = play(&[3, 3]);
        let text = board.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), ROWS + 1);
        assert_eq!(lines[4], ". . . O . . .");
        assert_eq!(lines[5], ". . . X . . .");
        assert_eq!(lines[6], "0 1 2 3 4 5 6");
    }

    #[test]
    fn test_player_other_and_number() {
        assert_eq!(Player::One.other(), Player::Two);
        assert_eq!(Player::Two.other(), Player::One);
        assert_eq!(Player::Two.number(), 2);
        assert_eq!(Player::One.to_string(), "player 1");
    }
}
