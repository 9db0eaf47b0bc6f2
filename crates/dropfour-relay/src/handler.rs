//! Per-connection handler: welcome, then route frames both ways.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Assign a peer id and send `Welcome`
//!   2. Loop: client frames go to the hub, hub frames go to the client
//!   3. On close, leave every channel the peer was in

use std::sync::Arc;

use dropfour_protocol::{ClientFrame, Codec, RelayFrame};
use dropfour_transport::{Connection, PeerId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::RelayError;
use crate::hub::Outbound;
use crate::server::RelayState;

/// Drop guard that removes a peer from every channel when its handler
/// exits, panics included. `Drop` is synchronous, so the async lock is
/// taken in a fire-and-forget task.
struct PeerGuard<C: Codec> {
    peer: PeerId,
    state: Arc<RelayState<C>>,
}

impl<C: Codec> Drop for PeerGuard<C> {
    fn drop(&mut self) {
        let peer = self.peer;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let left = state.hub.lock().await.disconnect(peer);
            tracing::info!(%peer, channels = left, "peer disconnected");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<RelayState<C>>,
) -> Result<(), RelayError> {
    let conn_id = conn.id();
    let peer = state.next_peer();
    let (outbound, mut queue) = mpsc::unbounded_channel();

    send_frame(&conn, &state.codec, &RelayFrame::Welcome { peer }).await?;
    let _guard = PeerGuard {
        peer,
        state: Arc::clone(&state),
    };
    tracing::info!(%conn_id, %peer, "peer connected");

    loop {
        tokio::select! {
            received = conn.recv() => {
                let data = match received {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::debug!(%peer, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%peer, error = %e, "recv error");
                        break;
                    }
                };

                let frame: ClientFrame = match state.codec.decode(&data) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::debug!(%peer, error = %e, "failed to decode client frame");
                        let message = format!("invalid frame: {e}");
                        send_frame(&conn, &state.codec, &RelayFrame::Error { message }).await?;
                        continue;
                    }
                };

                if let Err(e) = handle_frame(&state, peer, &outbound, frame).await {
                    let message = e.to_string();
                    send_frame(&conn, &state.codec, &RelayFrame::Error { message }).await?;
                }
            }
            Some(frame) = queue.recv() => {
                send_frame(&conn, &state.codec, &frame).await?;
            }
        }
    }

    // _guard drops here → the peer leaves every channel.
    Ok(())
}

/// Applies one client frame to the hub.
async fn handle_frame<C: Codec>(
    state: &RelayState<C>,
    peer: PeerId,
    outbound: &Outbound,
    frame: ClientFrame,
) -> Result<(), RelayError> {
    let mut hub = state.hub.lock().await;
    match frame {
        ClientFrame::Join { channel } => hub.join(&channel, peer, outbound.clone()),
        ClientFrame::Leave { channel } => {
            if hub.leave(&channel, peer) {
                tracing::debug!(
                    %peer,
                    %channel,
                    remaining = hub.member_count(&channel),
                    "left on request"
                );
            }
            Ok(())
        }
        ClientFrame::Send {
            channel,
            action,
            payload,
            target,
        } => hub.send(&channel, peer, action, payload, target),
    }
}

async fn send_frame(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    frame: &RelayFrame,
) -> Result<(), RelayError> {
    let bytes = codec.encode(frame)?;
    conn.send(&bytes).await?;
    Ok(())
}
