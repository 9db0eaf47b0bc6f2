//! # Dropfour
//!
//! Serverless peer-to-peer Connect Four.
//!
//! Two anonymous participants meet on a shared discovery channel, elect a
//! host between themselves by comparing single-use random tokens, move to
//! a private channel and play any number of games there, with surrender,
//! rematch votes that alternate the opener, and a clean return to the
//! lobby when either side quits or vanishes. No server ever decides
//! anything; a [`RelaySubstrate`](prelude::RelaySubstrate) only forwards
//! bytes between processes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dropfour::prelude::*;
//!
//! # async fn run() -> Result<(), DropfourError> {
//! let relay = RelaySubstrate::connect("127.0.0.1:9400").await?;
//! let mut game = Orchestrator::new(relay, DropfourConfig::default());
//!
//! let role = game.find_match().await?;
//! if game.is_my_turn() {
//!     game.play(3).await?;
//! }
//! while let Some(event) = game.next_event().await {
//!     println!("{role}: {event:?}\n{}", game.board());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod orchestrator;

pub use config::DropfourConfig;
pub use error::DropfourError;
pub use orchestrator::{GameEvent, Orchestrator};

/// Everything needed to run a game, in one import.
pub mod prelude {
    pub use crate::{DropfourConfig, DropfourError, GameEvent, Orchestrator};
    pub use dropfour_board::{Board, COLS, PlaceError, Placement, Player, ROWS};
    pub use dropfour_matchmaking::{MatchmakingConfig, MatchmakingError, Role};
    pub use dropfour_relay::{DEFAULT_BIND_ADDR, RelaySubstrate};
    pub use dropfour_session::{Departure, Outcome, Phase, Rematch, SessionError};
    pub use dropfour_transport::{MemoryNetwork, Substrate};
}
