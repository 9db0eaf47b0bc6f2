//! Serverless matchmaking for Dropfour.
//!
//! Every participant looking for a game joins one shared discovery
//! channel and announces a random token. Whenever two seekers hear each
//! other, the one with the greater token becomes host: it picks a fresh
//! session id, tells the other side, and both move to a private channel
//! named after that id. No server arbitrates anything.
//!
//! # Key types
//!
//! - [`Matchmaker`]: runs one attempt over a [`Substrate`](dropfour_transport::Substrate)
//! - [`Pairing`]: what a successful attempt hands to the session layer
//! - [`Election`]: the I/O-free host election both peers run
//! - [`MatchmakingConfig`]: channel names and timings

mod config;
mod coordinator;
mod election;
mod error;

pub use config::MatchmakingConfig;
pub use coordinator::{Matchmaker, Pairing};
pub use election::{Election, MatchPhase, Role, Step};
pub use error::MatchmakingError;
