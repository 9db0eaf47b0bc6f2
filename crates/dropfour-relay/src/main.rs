//! The relay binary.
//!
//! Usage: `dropfour-relay [BIND_ADDR]`. Log verbosity comes from
//! `RUST_LOG` (default `info`).

use dropfour_relay::{DEFAULT_BIND_ADDR, RelayError, RelayServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

    let server = RelayServer::builder().bind(&addr).build().await?;
    if let Ok(local) = server.local_addr() {
        tracing::info!(%local, "relay listening");
    }
    server.run().await
}
