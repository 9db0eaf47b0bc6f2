//! WebSocket relay for Dropfour.
//!
//! Peers in different processes need something to meet through. The
//! relay is that something, and nothing more: a fan-out of channel
//! membership and opaque actions over WebSocket. It never looks inside a
//! payload and never pairs anyone; matchmaking still happens between the
//! peers themselves.
//!
//! # Key types
//!
//! - [`RelayServer`]: accepts connections and fans frames out per channel
//! - [`RelaySubstrate`]: a [`Substrate`](dropfour_transport::Substrate)
//!   backed by one connection to a relay
//! - [`RelayError`]: everything that can go wrong on either side

mod client;
mod error;
mod handler;
mod hub;
mod server;

pub use client::{RelayChannel, RelaySubstrate};
pub use error::RelayError;
pub use server::{DEFAULT_BIND_ADDR, RelayServer, RelayServerBuilder};
