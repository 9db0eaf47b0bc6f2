//! The orchestrator: one participant's whole game, from lobby to teardown.
//!
//! Owns the session state and, while paired, the session messenger. User
//! intent comes in through the `async` methods; the opponent's traffic
//! comes out of [`Orchestrator::next_event`] already applied to the state.
//!
//! Every local mutation is applied before it is sent, and a rejected
//! action sends nothing.

use std::collections::VecDeque;

use dropfour_board::{Board, Placement, Player};
use dropfour_matchmaking::{Matchmaker, Role};
use dropfour_session::{
    Departure, Outcome, Phase, Rematch, SessionError, SessionEvent, SessionMessenger, SessionState,
};
use dropfour_transport::Substrate;

use crate::{DropfourConfig, DropfourError};

/// What the opponent's traffic did to our game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// The opponent's marker landed here.
    OpponentMoved(Placement),
    /// The game is decided. Follows the deciding `OpponentMoved`, or
    /// reports the opponent's surrender.
    GameOver(Outcome),
    /// The opponent wants a rematch; ours is still missing.
    OpponentVotedRematch,
    /// Both sides voted. A fresh board is up.
    RematchStarted { local_player: Player },
    /// The session is over and we are back in the lobby.
    OpponentLeft(Departure),
}

/// Drives one participant through matchmaking and any number of games.
pub struct Orchestrator<S: Substrate> {
    matchmaker: Matchmaker<S>,
    state: SessionState,
    messenger: Option<SessionMessenger<S::Channel>>,
    pending: VecDeque<GameEvent>,
}

impl<S: Substrate> Orchestrator<S> {
    pub fn new(substrate: S, config: DropfourConfig) -> Self {
        Self {
            matchmaker: Matchmaker::new(substrate, config.matchmaking),
            state: SessionState::new(),
            messenger: None,
            pending: VecDeque::new(),
        }
    }

    // ---- accessors ----

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        self.state.board()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Our role, while in a session.
    pub fn role(&self) -> Option<Role> {
        self.state.role()
    }

    pub fn is_my_turn(&self) -> bool {
        self.state.is_my_turn()
    }

    // ---- lobby ----

    /// Finds an opponent and starts the first game. The host opens.
    ///
    /// Dropping the future abandons the attempt.
    pub async fn find_match(&mut self) -> Result<Role, DropfourError> {
        if self.state.phase().in_session() {
            return Err(SessionError::AlreadyInSession.into());
        }
        let pairing = self.matchmaker.find_match().await?;
        let role = pairing.role;

        self.state.begin(role)?;
        self.messenger = Some(SessionMessenger::new(pairing));
        self.pending.clear();
        Ok(role)
    }

    // ---- local actions ----

    /// Drops our marker into `column` and tells the opponent.
    ///
    /// # Errors
    /// A rejected move leaves the board untouched and sends nothing.
    pub async fn play(&mut self, column: usize) -> Result<Placement, DropfourError> {
        let placement = self.state.local_move(column)?;
        self.messenger()?.send_move(column).await?;
        tracing::debug!(column, row = placement.row, "played");
        Ok(placement)
    }

    /// Resigns the running game.
    pub async fn surrender(&mut self) -> Result<Outcome, DropfourError> {
        let outcome = self.state.local_surrender()?;
        self.messenger()?.send_surrender().await?;
        Ok(outcome)
    }

    /// Votes for a rematch of the game on display.
    pub async fn vote_rematch(&mut self) -> Result<Rematch, DropfourError> {
        let rematch = self.state.local_vote()?;
        self.messenger()?.send_rematch_vote().await?;
        Ok(rematch)
    }

    /// Tells the opponent we are leaving, then leaves. Back to the lobby
    /// whatever happens on the wire.
    pub async fn quit(&mut self) -> Result<(), DropfourError> {
        let messenger = self.messenger.take().ok_or(SessionError::NotInSession)?;
        if let Err(e) = messenger.send_quit().await {
            tracing::warn!(error = %e, "could not deliver quit");
        }
        Self::close(messenger).await;
        self.end(Departure::Voluntary);
        Ok(())
    }

    /// Leaves the session channel without a word. The opponent sees a
    /// disconnect.
    pub async fn leave_session(&mut self) -> Result<(), DropfourError> {
        let messenger = self.messenger.take().ok_or(SessionError::NotInSession)?;
        Self::close(messenger).await;
        self.end(Departure::Voluntary);
        Ok(())
    }

    // ---- remote events ----

    /// Waits for the opponent's next relevant action and applies it.
    ///
    /// Stale traffic is absorbed. Returns `None` outside a session.
    /// Cancel-safe: nothing is lost if the future is dropped while waiting.
    pub async fn next_event(&mut self) -> Option<GameEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        loop {
            let messenger = self.messenger.as_mut()?;
            let event = messenger.next_event().await.unwrap_or(SessionEvent::PeerLeft);
            if let Some(game_event) = self.apply(event) {
                return Some(game_event);
            }
        }
    }

    fn apply(&mut self, event: SessionEvent) -> Option<GameEvent> {
        match event {
            SessionEvent::MoveReceived { column } => {
                let placement = self.state.remote_move(column)?;
                if let Some(outcome) = self.state.phase().outcome() {
                    self.pending.push_back(GameEvent::GameOver(outcome));
                }
                Some(GameEvent::OpponentMoved(placement))
            }
            SessionEvent::SurrenderReceived => {
                self.state.remote_surrender().map(GameEvent::GameOver)
            }
            SessionEvent::RematchVoteReceived => match self.state.remote_vote()? {
                Rematch::Pending => Some(GameEvent::OpponentVotedRematch),
                Rematch::Started { local_player } => {
                    Some(GameEvent::RematchStarted { local_player })
                }
            },
            SessionEvent::QuitReceived => self.depart(Departure::Voluntary),
            SessionEvent::PeerLeft => self.depart(Departure::Involuntary),
        }
    }

    /// The opponent is gone. Dropping the messenger leaves the channel.
    fn depart(&mut self, departure: Departure) -> Option<GameEvent> {
        self.messenger = None;
        self.end(departure).map(GameEvent::OpponentLeft)
    }

    fn end(&mut self, departure: Departure) -> Option<Departure> {
        self.pending.clear();
        self.state.teardown(departure)
    }

    async fn close(messenger: SessionMessenger<S::Channel>) {
        if let Err(e) = messenger.leave().await {
            tracing::debug!(error = %e, "leaving session channel failed");
        }
    }

    fn messenger(&self) -> Result<&SessionMessenger<S::Channel>, SessionError> {
        self.messenger.as_ref().ok_or(SessionError::NotInSession)
    }
}
