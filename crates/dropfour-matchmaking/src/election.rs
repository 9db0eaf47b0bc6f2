//! Host election for one matchmaking attempt, with no I/O.
//!
//! Both peers run this same state machine. Whenever two seekers see each
//! other, the one holding the greater token hosts and the other waits for
//! its `accept`, so exactly one of them ever creates a session:
//!
//! ```text
//!   Idle ──start()──→ Seeking ──seeking(smaller token)──→ Paired(Host)
//!                        │
//!                        └──────accept(session id)──────→ Paired(Guest)
//! ```
//!
//! `Paired` is terminal: every later lobby event for this attempt is
//! ignored, which is what makes acceptance one-shot when more than two
//! seekers are around.

use std::fmt;

use dropfour_protocol::{MatchToken, SessionId};
use dropfour_transport::PeerId;
use serde::{Deserialize, Serialize};

/// Which side of a session this participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Won the election and chose the session id. Opens the first game.
    Host,
    /// Lost the election and joined the host's session.
    Guest,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

/// Where an attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Idle,
    Seeking,
    Paired(Role),
}

/// What the driver should do in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do.
    Ignore,
    /// Announce our token, to everyone (`None`) or to one newcomer.
    Announce { target: Option<PeerId> },
    /// We lost the comparison; keep seeking and wait for an accept.
    Wait,
    /// We won: send `accept(session_id)` to `guest` and open the session.
    Host { guest: PeerId, session_id: SessionId },
    /// We were accepted: join `host`'s session.
    Join { host: PeerId, session_id: SessionId },
}

/// The election state machine for a single attempt.
#[derive(Debug)]
pub struct Election {
    token: MatchToken,
    phase: MatchPhase,
}

impl Election {
    /// Creates an idle election holding this attempt's token.
    pub fn new(token: MatchToken) -> Self {
        Self {
            token,
            phase: MatchPhase::Idle,
        }
    }

    /// This attempt's token.
    pub fn token(&self) -> &MatchToken {
        &self.token
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Idle → Seeking. Called as soon as the lobby is joined, so peers
    /// already present get our token right away.
    pub fn start(&mut self) {
        if self.phase == MatchPhase::Idle {
            self.phase = MatchPhase::Seeking;
        }
    }

    /// The announce delay elapsed. While still seeking, asks for the
    /// broadcast announcement.
    pub fn on_announce_timer(&self) -> Step {
        match self.phase {
            MatchPhase::Seeking => Step::Announce { target: None },
            _ => Step::Ignore,
        }
    }

    /// A peer appeared in the lobby. While seeking, it gets our token.
    pub fn on_peer_joined(&self, peer: PeerId) -> Step {
        match self.phase {
            MatchPhase::Seeking => Step::Announce { target: Some(peer) },
            _ => Step::Ignore,
        }
    }

    /// Another seeker announced its token.
    ///
    /// Equal tokens elect nobody; with 128-bit random tokens that does not
    /// happen in practice, so it is left to stall rather than handled.
    pub fn on_seeking(&mut self, from: PeerId, other: &MatchToken) -> Step {
        if self.phase != MatchPhase::Seeking {
            return Step::Ignore;
        }
        if self.token > *other {
            self.phase = MatchPhase::Paired(Role::Host);
            Step::Host {
                guest: from,
                session_id: SessionId::generate(),
            }
        } else {
            Step::Wait
        }
    }

    /// A host accepted us. First accept wins.
    pub fn on_accept(&mut self, from: PeerId, session_id: SessionId) -> Step {
        if self.phase != MatchPhase::Seeking {
            return Step::Ignore;
        }
        self.phase = MatchPhase::Paired(Role::Guest);
        Step::Join {
            host: from,
            session_id,
        }
    }
}
