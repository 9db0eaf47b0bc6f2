//! The matchmaker: drives an [`Election`] over a real substrate.
//!
//! One call to [`Matchmaker::find_match`] is one attempt:
//!   1. Join the discovery channel, start seeking with a fresh token
//!   2. Announce the token (broadcast after the delay, targeted to newcomers)
//!   3. Feed lobby traffic to the election until it pairs us
//!   4. Open the private session channel and leave the lobby
//!   5. Wait for the counterpart to show up there

use std::time::Duration;

use dropfour_protocol::{
    Codec, JsonCodec, LobbyMessage, MatchToken, SessionId, WireMessage,
};
use dropfour_transport::{Channel, ChannelEvent, ChannelEvents, PeerId, Substrate};

use crate::election::{Election, Step};
use crate::{MatchmakingConfig, MatchmakingError, Role};

/// The result of a successful attempt: a joined session channel whose
/// counterpart is known to be present.
pub struct Pairing<Ch> {
    /// Which side we are on.
    pub role: Role,
    /// The session both peers joined.
    pub session_id: SessionId,
    /// The counterpart's id.
    pub peer: PeerId,
    /// The token this attempt used. Discarded after matchmaking.
    pub token: MatchToken,
    /// Outbound half of the session channel.
    pub channel: Ch,
    /// Inbound half of the session channel.
    pub events: ChannelEvents,
}

impl<Ch> std::fmt::Debug for Pairing<Ch> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pairing")
            .field("role", &self.role)
            .field("session_id", &self.session_id)
            .field("peer", &self.peer)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Finds an opponent on the discovery channel of a substrate.
pub struct Matchmaker<S: Substrate, C: Codec = JsonCodec> {
    substrate: S,
    codec: C,
    config: MatchmakingConfig,
}

impl<S: Substrate> Matchmaker<S> {
    /// Creates a matchmaker speaking JSON on the wire.
    pub fn new(substrate: S, config: MatchmakingConfig) -> Self {
        Self::with_codec(substrate, JsonCodec, config)
    }
}

impl<S: Substrate, C: Codec> Matchmaker<S, C> {
    /// Creates a matchmaker with an explicit codec.
    pub fn with_codec(substrate: S, codec: C, config: MatchmakingConfig) -> Self {
        Self {
            substrate,
            codec,
            config,
        }
    }

    /// The substrate this matchmaker joins channels on.
    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// The active configuration.
    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    /// Runs one matchmaking attempt with a fresh token.
    ///
    /// Waits as long as it takes for an opponent to appear. Wrap in
    /// `tokio::time::timeout` to bound the search; dropping the future
    /// leaves the lobby.
    ///
    /// # Errors
    /// [`MatchmakingError::PeerNeverArrived`] if the counterpart never
    /// joined the session channel; the attempt is over and the caller
    /// may simply try again.
    pub async fn find_match(&self) -> Result<Pairing<S::Channel>, MatchmakingError> {
        let token = MatchToken::generate();
        let lobby_id = self.config.lobby();
        let (lobby, mut lobby_events) = self.substrate.join(&lobby_id).await?;
        let local = lobby.local_peer();
        tracing::info!(peer = %local, lobby = %lobby_id, "seeking opponent");

        let mut election = Election::new(token);
        election.start();

        let announce = tokio::time::sleep(self.config.announce_delay);
        tokio::pin!(announce);
        let mut announced = false;

        let (role, peer, session_id) = loop {
            let step = tokio::select! {
                () = &mut announce, if !announced => {
                    announced = true;
                    election.on_announce_timer()
                }
                event = lobby_events.recv() => match event {
                    Some(event) => self.on_lobby_event(&mut election, event),
                    None => return Err(MatchmakingError::LobbyClosed),
                },
            };

            match step {
                Step::Ignore | Step::Wait => {}
                Step::Announce { target } => {
                    let msg = LobbyMessage::Seeking {
                        token: election.token().clone(),
                    };
                    self.send(&lobby, &msg, target).await?;
                    tracing::debug!(peer = %local, ?target, "announced token");
                }
                Step::Host { guest, session_id } => {
                    let msg = LobbyMessage::Accept {
                        session_id: session_id.clone(),
                    };
                    self.send(&lobby, &msg, Some(guest)).await?;
                    break (Role::Host, guest, session_id);
                }
                Step::Join { host, session_id } => {
                    break (Role::Guest, host, session_id);
                }
            }
        };

        tracing::info!(peer = %local, %role, opponent = %peer, %session_id, "paired");

        let session_channel = self.config.session_channel(&session_id);
        let (channel, mut events) = self.substrate.join(&session_channel).await?;
        lobby.leave().await?;

        if !wait_for_peer(&mut events, peer, self.config.peer_wait_timeout).await {
            tracing::warn!(peer = %local, opponent = %peer, %session_id, "opponent never arrived");
            channel.leave().await?;
            return Err(MatchmakingError::PeerNeverArrived { session_id, peer });
        }

        Ok(Pairing {
            role,
            session_id,
            peer,
            token: election.token().clone(),
            channel,
            events,
        })
    }

    fn on_lobby_event(&self, election: &mut Election, event: ChannelEvent) -> Step {
        match event {
            ChannelEvent::PeerJoined(peer) => election.on_peer_joined(peer),
            ChannelEvent::PeerLeft(_) => Step::Ignore,
            ChannelEvent::Action {
                name,
                payload,
                from,
            } => match LobbyMessage::decode_action(&self.codec, &name, &payload) {
                Ok(LobbyMessage::Seeking { token }) => election.on_seeking(from, &token),
                Ok(LobbyMessage::Accept { session_id }) => election.on_accept(from, session_id),
                Err(e) => {
                    tracing::debug!(%from, action = %name, error = %e, "skipping lobby message");
                    Step::Ignore
                }
            },
        }
    }

    async fn send(
        &self,
        lobby: &S::Channel,
        msg: &LobbyMessage,
        target: Option<PeerId>,
    ) -> Result<(), MatchmakingError> {
        let payload = msg.encode_payload(&self.codec)?;
        lobby.broadcast(msg.action(), &payload, target).await?;
        Ok(())
    }
}

/// Waits until `peer` is present in the channel. Events from anyone else
/// are dropped; the counterpart cannot send anything before its own
/// `PeerJoined`, so nothing of interest is lost.
async fn wait_for_peer(events: &mut ChannelEvents, peer: PeerId, limit: Duration) -> bool {
    let arrival = async {
        while let Some(event) = events.recv().await {
            if event == ChannelEvent::PeerJoined(peer) {
                return true;
            }
        }
        false
    };
    matches!(tokio::time::timeout(limit, arrival).await, Ok(true))
}
