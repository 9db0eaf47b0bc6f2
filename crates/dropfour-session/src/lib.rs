//! Session layer for Dropfour.
//!
//! Once matchmaking has paired two peers, this crate keeps their two
//! independently running games consistent:
//!
//! 1. **Messaging**: [`SessionMessenger`] sends and receives the four
//!    session messages (move, surrender, rematch vote, quit) and reports
//!    when the counterpart leaves.
//! 2. **State**: [`SessionState`] tracks turn ownership, the outcome, the
//!    rematch votes and who opens the next game, and decides which
//!    inbound events are still relevant.
//!
//! # How it fits in the stack
//!
//! ```text
//! Orchestrator (above)   ← feeds user intent and messenger events into the state
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Matchmaking (below)    ← hands over a Pairing: role, peer, joined channel
//! ```

mod error;
mod messenger;
mod state;

pub use error::SessionError;
pub use messenger::{SessionEvent, SessionMessenger};
pub use state::{Departure, Outcome, Phase, Rematch, SessionState, Votes};
