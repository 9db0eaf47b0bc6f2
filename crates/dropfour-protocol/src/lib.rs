//! Wire protocol for Dropfour.
//!
//! This crate defines what peers say to each other:
//!
//! - **Types** ([`LobbyMessage`], [`SessionMessage`], [`MatchToken`],
//!   [`SessionId`]): the payloads exchanged on the discovery channel and
//!   on a private session channel, and the identifiers inside them.
//! - **Relay frames** ([`ClientFrame`], [`RelayFrame`]): how substrate
//!   traffic is carried to and from a relay server.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those are converted
//!   to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Substrate (action, bytes) → Protocol (LobbyMessage / SessionMessage) → Matchmaking / Session
//! ```

mod codec;
mod error;
mod relay;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use relay::{ClientFrame, RelayFrame};
pub use types::{
    AcceptPayload, EmptyPayload, LobbyMessage, MatchToken, MovePayload, SeekingPayload,
    SessionId, SessionMessage, WireMessage,
};
