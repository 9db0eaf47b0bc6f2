//! Session state: one participant's view of a running session.
//!
//! Owns the board replica, the role, who opens the current game and the
//! two rematch votes. Local operations return `Err` when rejected and
//! leave everything untouched; remote operations return `None` when the
//! event is stale and likewise change nothing.
//!
//! ```text
//!   Lobby ──begin()──→ Playing ──win / draw / surrender──→ Ended
//!                         ↑                                  │ first vote
//!                         │ second vote                      ▼
//!                         └──────────────────────── NegotiatingRematch
//!
//!   any state ──teardown()──→ Lobby
//! ```

use std::fmt;

use dropfour_board::{Board, Placement, Player};
use dropfour_matchmaking::Role;

use crate::SessionError;

// ---------------------------------------------------------------------------
// Outcome / Phase
// ---------------------------------------------------------------------------

/// How a single game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Four in a row.
    Won(Player),
    /// `by` gave up; the other side wins. A session-level overlay, the
    /// board itself knows nothing about it.
    Resigned { by: Player },
    /// The board filled up with no winner.
    Draw,
}

impl Outcome {
    /// The winning player, if any.
    pub fn winner(self) -> Option<Player> {
        match self {
            Self::Won(player) => Some(player),
            Self::Resigned { by } => Some(by.other()),
            Self::Draw => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Won(player) => write!(f, "{player} wins"),
            Self::Resigned { by } => write!(f, "{by} resigned, {} wins", by.other()),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session.
    Lobby,
    /// A game is in progress.
    Playing,
    /// The game is decided and nobody has voted for a rematch yet.
    Ended(Outcome),
    /// One side has voted for a rematch.
    NegotiatingRematch(Outcome),
}

impl Phase {
    /// Returns `true` outside the lobby.
    pub fn in_session(&self) -> bool {
        !matches!(self, Self::Lobby)
    }

    /// The outcome of the last game while it is on display.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Ended(outcome) | Self::NegotiatingRematch(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "in lobby"),
            Self::Playing => write!(f, "playing"),
            Self::Ended(outcome) => write!(f, "ended: {outcome}"),
            Self::NegotiatingRematch(_) => write!(f, "negotiating rematch"),
        }
    }
}

// ---------------------------------------------------------------------------
// Votes / results
// ---------------------------------------------------------------------------

/// The two rematch votes for the game on display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Votes {
    pub local: bool,
    pub remote: bool,
}

/// The effect of a rematch vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rematch {
    /// Recorded; the other side has not voted yet.
    Pending,
    /// Both voted. The board was reset and the new game is running with
    /// us holding `local_player`.
    Started { local_player: Player },
}

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Someone quit on purpose.
    Voluntary,
    /// The counterpart vanished without quitting.
    Involuntary,
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voluntary => write!(f, "left the game"),
            Self::Involuntary => write!(f, "disconnected"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// One participant's session state.
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: Phase,
    board: Board,
    role: Option<Role>,
    /// The role holding `Player::One`, which always opens a fresh board.
    opener: Role,
    votes: Votes,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// A state sitting in the lobby.
    pub fn new() -> Self {
        Self {
            phase: Phase::Lobby,
            board: Board::new(),
            role: None,
            opener: Role::Host,
            votes: Votes::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Our role, while in a session.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// The role that opens the current game.
    pub fn opener(&self) -> Role {
        self.opener
    }

    pub fn votes(&self) -> Votes {
        self.votes
    }

    /// The marker we play in the current game.
    pub fn local_player(&self) -> Option<Player> {
        self.role.map(|role| {
            if role == self.opener {
                Player::One
            } else {
                Player::Two
            }
        })
    }

    /// `true` while playing with our marker on turn.
    pub fn is_my_turn(&self) -> bool {
        self.phase == Phase::Playing && self.local_player() == Some(self.board.turn())
    }

    /// Lobby → Playing with a fresh board. The host opens the first game.
    ///
    /// # Errors
    /// [`SessionError::AlreadyInSession`] outside the lobby.
    pub fn begin(&mut self, role: Role) -> Result<Player, SessionError> {
        if self.phase.in_session() {
            return Err(SessionError::AlreadyInSession);
        }
        self.board.reset();
        self.role = Some(role);
        self.opener = Role::Host;
        self.votes = Votes::default();
        self.phase = Phase::Playing;

        let local_player = self.local_player().unwrap_or(Player::One);
        tracing::info!(%role, %local_player, "session started");
        Ok(local_player)
    }

    // ---- moves ----

    /// Places our marker. Only valid while playing and on our turn.
    ///
    /// # Errors
    /// `NotInSession`, `NotPlaying`, `NotYourTurn`, or `Rejected` with the
    /// board's reason. In every case nothing changed and nothing may be
    /// sent to the peer.
    pub fn local_move(&mut self, column: usize) -> Result<Placement, SessionError> {
        self.ensure_playing()?;
        if !self.is_my_turn() {
            return Err(SessionError::NotYourTurn);
        }
        let placement = self.board.place(column)?;
        self.settle();
        Ok(placement)
    }

    /// Applies the opponent's move. `None` if it is stale: no game in
    /// progress, our marker on turn, or a column our replica rejects.
    pub fn remote_move(&mut self, column: usize) -> Option<Placement> {
        if self.phase != Phase::Playing {
            tracing::debug!(column, phase = %self.phase, "ignoring move outside play");
            return None;
        }
        if self.is_my_turn() {
            tracing::debug!(column, "ignoring opponent move out of turn");
            return None;
        }
        match self.board.place(column) {
            Ok(placement) => {
                self.settle();
                Some(placement)
            }
            Err(e) => {
                tracing::debug!(column, error = %e, "ignoring rejected opponent move");
                None
            }
        }
    }

    /// Ends the game if the last placement decided it.
    fn settle(&mut self) {
        let outcome = match self.board.winner() {
            Some(player) => Outcome::Won(player),
            None if self.board.is_full() => Outcome::Draw,
            None => return,
        };
        self.end(outcome);
    }

    // ---- surrender ----

    /// We resign the running game.
    ///
    /// # Errors
    /// `NotInSession` or `NotPlaying`.
    pub fn local_surrender(&mut self) -> Result<Outcome, SessionError> {
        self.ensure_playing()?;
        let by = self.local_player().unwrap_or(Player::One);
        let outcome = Outcome::Resigned { by };
        self.end(outcome);
        Ok(outcome)
    }

    /// The opponent resigned. `None` unless a game is in progress.
    pub fn remote_surrender(&mut self) -> Option<Outcome> {
        if self.phase != Phase::Playing {
            tracing::debug!(phase = %self.phase, "ignoring surrender outside play");
            return None;
        }
        let by = self.local_player()?.other();
        let outcome = Outcome::Resigned { by };
        self.end(outcome);
        Some(outcome)
    }

    fn end(&mut self, outcome: Outcome) {
        self.phase = Phase::Ended(outcome);
        self.votes = Votes::default();
        tracing::info!(%outcome, "game over");
    }

    // ---- rematch ----

    /// Records our rematch vote.
    ///
    /// # Errors
    /// `NotInSession`, `GameNotOver` while playing, `AlreadyVoted` on a
    /// repeat vote for the same game.
    pub fn local_vote(&mut self) -> Result<Rematch, SessionError> {
        let outcome = match self.phase {
            Phase::Lobby => return Err(SessionError::NotInSession),
            Phase::Playing => return Err(SessionError::GameNotOver),
            Phase::Ended(outcome) | Phase::NegotiatingRematch(outcome) => outcome,
        };
        if self.votes.local {
            return Err(SessionError::AlreadyVoted);
        }
        self.votes.local = true;
        Ok(self.tally(outcome))
    }

    /// Records the opponent's rematch vote. `None` if there is no ended
    /// game to vote on (a vote left over from an earlier game, or a
    /// duplicate).
    pub fn remote_vote(&mut self) -> Option<Rematch> {
        let Some(outcome) = self.phase.outcome() else {
            tracing::debug!(phase = %self.phase, "ignoring rematch vote");
            return None;
        };
        if self.votes.remote {
            tracing::debug!("ignoring duplicate rematch vote");
            return None;
        }
        self.votes.remote = true;
        Some(self.tally(outcome))
    }

    /// Starts the rematch once both votes are in.
    fn tally(&mut self, outcome: Outcome) -> Rematch {
        if !(self.votes.local && self.votes.remote) {
            self.phase = Phase::NegotiatingRematch(outcome);
            return Rematch::Pending;
        }

        self.board.reset();
        self.opener = match self.opener {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        };
        self.votes = Votes::default();
        self.phase = Phase::Playing;

        let local_player = self.local_player().unwrap_or(Player::One);
        tracing::info!(opener = %self.opener, %local_player, "rematch started");
        Rematch::Started { local_player }
    }

    // ---- teardown ----

    /// Returns to the lobby from any state, clearing board, role, votes
    /// and the opener. `None` if already in the lobby.
    pub fn teardown(&mut self, departure: Departure) -> Option<Departure> {
        if !self.phase.in_session() {
            return None;
        }
        *self = Self::new();
        tracing::info!(?departure, "session torn down");
        Some(departure)
    }

    fn ensure_playing(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Lobby => Err(SessionError::NotInSession),
            Phase::Playing => Ok(()),
            other => Err(SessionError::NotPlaying(other)),
        }
    }
}
