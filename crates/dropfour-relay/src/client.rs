//! Relay-backed substrate: the client half of the relay.
//!
//! One WebSocket connection carries every channel a participant joins. A
//! background reader task decodes relay frames and routes each one to the
//! event stream of the channel it belongs to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dropfour_protocol::{ClientFrame, Codec, JsonCodec, RelayFrame};
use dropfour_transport::{
    Channel, ChannelEvent, ChannelEvents, ChannelId, Connection, PeerId, Substrate,
    TransportError, WebSocketConnection,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::RelayError;

/// How long to wait for the relay's `Welcome`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

type Routes = HashMap<ChannelId, mpsc::UnboundedSender<ChannelEvent>>;

/// State shared by the substrate, its channels and the reader task.
struct Shared<C: Codec> {
    conn: WebSocketConnection,
    codec: C,
    peer: PeerId,
    routes: Mutex<Routes>,
}

impl<C: Codec> Shared<C> {
    fn routes(&self) -> MutexGuard<'_, Routes> {
        // The map stays consistent even if a holder panicked.
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn send_frame(&self, frame: &ClientFrame) -> Result<(), TransportError> {
        let bytes = self
            .codec
            .encode(frame)
            .map_err(|e| TransportError::BadFrame(e.to_string()))?;
        self.conn.send(&bytes).await
    }

    /// Routes one relay frame to its channel's event stream.
    fn dispatch(&self, frame: RelayFrame) {
        let (channel, event) = match frame {
            RelayFrame::PeerJoined { channel, peer } => (channel, ChannelEvent::PeerJoined(peer)),
            RelayFrame::PeerLeft { channel, peer } => (channel, ChannelEvent::PeerLeft(peer)),
            RelayFrame::Action {
                channel,
                action,
                payload,
                from,
            } => (
                channel,
                ChannelEvent::Action {
                    name: action,
                    payload,
                    from,
                },
            ),
            RelayFrame::Error { message } => {
                tracing::warn!(peer = %self.peer, %message, "relay refused a frame");
                return;
            }
            RelayFrame::Welcome { .. } => {
                tracing::debug!(peer = %self.peer, "ignoring repeated welcome");
                return;
            }
        };
        match self.routes().get(&channel) {
            Some(tx) => {
                let _ = tx.send(event);
            }
            None => tracing::debug!(%channel, "frame for a channel we left"),
        }
    }
}

/// Aborts the reader task once the last handle is gone.
struct ReaderTask(JoinHandle<()>);

impl Drop for ReaderTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A [`Substrate`] reached through a relay server.
///
/// Cheap to clone; all clones share one connection and one peer id.
pub struct RelaySubstrate<C: Codec = JsonCodec> {
    shared: Arc<Shared<C>>,
    reader: Arc<ReaderTask>,
}

impl<C: Codec> Clone for RelaySubstrate<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            reader: Arc::clone(&self.reader),
        }
    }
}

impl RelaySubstrate {
    /// Connects to a relay at `addr` (`host:port`), speaking JSON.
    pub async fn connect(addr: &str) -> Result<Self, RelayError> {
        Self::connect_with_codec(addr, JsonCodec).await
    }
}

impl<C: Codec> RelaySubstrate<C> {
    /// Connects with an explicit frame codec. Must match the relay's.
    ///
    /// # Errors
    /// [`RelayError::Handshake`] if the relay does not greet us with a
    /// `Welcome` frame in time.
    pub async fn connect_with_codec(addr: &str, codec: C) -> Result<Self, RelayError> {
        let conn = WebSocketConnection::connect(addr).await?;

        let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(RelayError::Handshake("connection closed before welcome".into()));
            }
            Ok(Err(e)) => return Err(RelayError::Transport(e)),
            Err(_) => return Err(RelayError::Handshake("welcome timed out".into())),
        };
        let greeting: RelayFrame = codec.decode(&data)?;
        let peer = match greeting {
            RelayFrame::Welcome { peer } => peer,
            other => {
                return Err(RelayError::Handshake(format!(
                    "expected welcome, got {other:?}"
                )));
            }
        };
        tracing::info!(addr, %peer, "connected to relay");

        let shared = Arc::new(Shared {
            conn,
            codec,
            peer,
            routes: Mutex::new(HashMap::new()),
        });
        let reader = tokio::spawn(read_frames(Arc::clone(&shared)));

        Ok(Self {
            shared,
            reader: Arc::new(ReaderTask(reader)),
        })
    }

    /// The peer id the relay assigned to this connection.
    pub fn local_peer(&self) -> PeerId {
        self.shared.peer
    }
}

/// Reads frames until the connection ends, then closes every channel's
/// event stream so listeners observe the loss.
async fn read_frames<C: Codec>(shared: Arc<Shared<C>>) {
    loop {
        match shared.conn.recv().await {
            Ok(Some(data)) => match shared.codec.decode::<RelayFrame>(&data) {
                Ok(frame) => shared.dispatch(frame),
                Err(e) => tracing::warn!(error = %e, "undecodable relay frame"),
            },
            Ok(None) => {
                tracing::info!(peer = %shared.peer, "relay closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!(peer = %shared.peer, error = %e, "relay connection failed");
                break;
            }
        }
    }
    shared.routes().clear();
}

impl<C: Codec> Substrate for RelaySubstrate<C> {
    type Channel = RelayChannel<C>;

    async fn join(
        &self,
        channel: &ChannelId,
    ) -> Result<(RelayChannel<C>, ChannelEvents), TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut routes = self.shared.routes();
            if routes.contains_key(channel) {
                return Err(TransportError::AlreadyJoined(channel.clone()));
            }
            routes.insert(channel.clone(), tx);
        }

        let frame = ClientFrame::Join {
            channel: channel.clone(),
        };
        if let Err(e) = self.shared.send_frame(&frame).await {
            self.shared.routes().remove(channel);
            return Err(e);
        }
        tracing::debug!(peer = %self.shared.peer, %channel, "joined relay channel");

        Ok((
            RelayChannel {
                id: channel.clone(),
                shared: Arc::clone(&self.shared),
                _reader: Arc::clone(&self.reader),
            },
            rx,
        ))
    }
}

/// A channel joined through a relay. Dropping the handle leaves.
pub struct RelayChannel<C: Codec = JsonCodec> {
    id: ChannelId,
    shared: Arc<Shared<C>>,
    _reader: Arc<ReaderTask>,
}

impl<C: Codec> Channel for RelayChannel<C> {
    async fn broadcast(
        &self,
        action: &str,
        payload: &[u8],
        target: Option<PeerId>,
    ) -> Result<(), TransportError> {
        if !self.shared.routes().contains_key(&self.id) {
            return Err(TransportError::NotJoined(self.id.clone()));
        }
        let frame = ClientFrame::Send {
            channel: self.id.clone(),
            action: action.to_string(),
            payload: payload.to_vec(),
            target,
        };
        self.shared.send_frame(&frame).await
    }

    async fn leave(&self) -> Result<(), TransportError> {
        if self.shared.routes().remove(&self.id).is_none() {
            return Ok(());
        }
        let frame = ClientFrame::Leave {
            channel: self.id.clone(),
        };
        self.shared.send_frame(&frame).await?;
        tracing::debug!(peer = %self.shared.peer, channel = %self.id, "left relay channel");
        Ok(())
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    fn local_peer(&self) -> PeerId {
        self.shared.peer
    }
}

impl<C: Codec> Drop for RelayChannel<C> {
    fn drop(&mut self) {
        if self.shared.routes().remove(&self.id).is_none() {
            return;
        }
        // Still joined: tell the relay from a task, if a runtime is around.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let frame = ClientFrame::Leave {
            channel: self.id.clone(),
        };
        runtime.spawn(async move {
            if let Err(e) = shared.send_frame(&frame).await {
                tracing::debug!(error = %e, "leave on drop failed");
            }
        });
    }
}
