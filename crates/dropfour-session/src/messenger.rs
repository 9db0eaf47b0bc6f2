//! The session messenger: typed traffic on a private session channel.
//!
//! Wraps the channel a [`Pairing`] handed over. Outbound messages are
//! addressed to the counterpart only; inbound traffic from anyone else,
//! and anything that does not decode, is dropped.

use dropfour_matchmaking::Pairing;
use dropfour_protocol::{Codec, JsonCodec, SessionId, SessionMessage, WireMessage};
use dropfour_transport::{Channel, ChannelEvent, ChannelEvents, PeerId};

use crate::SessionError;

/// Something the counterpart did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    MoveReceived { column: usize },
    SurrenderReceived,
    RematchVoteReceived,
    QuitReceived,
    /// The counterpart left the channel, or the substrate went away.
    /// Reported once; the stream ends after it.
    PeerLeft,
}

/// Sends and receives session messages for one paired session.
pub struct SessionMessenger<Ch: Channel, C: Codec = JsonCodec> {
    channel: Ch,
    events: ChannelEvents,
    peer: PeerId,
    session_id: SessionId,
    codec: C,
    departed: bool,
}

impl<Ch: Channel> SessionMessenger<Ch> {
    /// Takes over a pairing's channel, speaking JSON.
    pub fn new(pairing: Pairing<Ch>) -> Self {
        Self::with_codec(pairing, JsonCodec)
    }
}

impl<Ch: Channel, C: Codec> SessionMessenger<Ch, C> {
    /// Takes over a pairing's channel with an explicit codec.
    pub fn with_codec(pairing: Pairing<Ch>, codec: C) -> Self {
        Self {
            channel: pairing.channel,
            events: pairing.events,
            peer: pairing.peer,
            session_id: pairing.session_id,
            codec,
            departed: false,
        }
    }

    /// The counterpart's id.
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub async fn send_move(&self, column: usize) -> Result<(), SessionError> {
        self.send(SessionMessage::Move { column }).await
    }

    pub async fn send_surrender(&self) -> Result<(), SessionError> {
        self.send(SessionMessage::Surrender).await
    }

    pub async fn send_rematch_vote(&self) -> Result<(), SessionError> {
        self.send(SessionMessage::RematchVote).await
    }

    pub async fn send_quit(&self) -> Result<(), SessionError> {
        self.send(SessionMessage::Quit).await
    }

    /// Leaves the session channel. The counterpart sees `PeerLeft`.
    pub async fn leave(&self) -> Result<(), SessionError> {
        self.channel.leave().await?;
        tracing::debug!(session_id = %self.session_id, "left session channel");
        Ok(())
    }

    async fn send(&self, msg: SessionMessage) -> Result<(), SessionError> {
        let payload = msg.encode_payload(&self.codec)?;
        self.channel
            .broadcast(msg.action(), &payload, Some(self.peer))
            .await?;
        tracing::debug!(session_id = %self.session_id, action = msg.action(), "sent");
        Ok(())
    }

    /// Waits for the counterpart's next message.
    ///
    /// Returns `None` once `PeerLeft` has been reported.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if self.departed {
            return None;
        }
        loop {
            let Some(event) = self.events.recv().await else {
                return Some(self.depart());
            };
            match event {
                ChannelEvent::PeerLeft(peer) if peer == self.peer => {
                    return Some(self.depart());
                }
                ChannelEvent::PeerJoined(_) | ChannelEvent::PeerLeft(_) => {}
                ChannelEvent::Action { from, name, .. } if from != self.peer => {
                    tracing::debug!(%from, action = %name, "ignoring message from a stranger");
                }
                ChannelEvent::Action { name, payload, .. } => {
                    match SessionMessage::decode_action(&self.codec, &name, &payload) {
                        Ok(msg) => return Some(msg.into()),
                        Err(e) => {
                            tracing::warn!(
                                session_id = %self.session_id,
                                action = %name,
                                error = %e,
                                "undecodable session message"
                            );
                        }
                    }
                }
            }
        }
    }

    fn depart(&mut self) -> SessionEvent {
        self.departed = true;
        tracing::info!(session_id = %self.session_id, peer = %self.peer, "opponent left");
        SessionEvent::PeerLeft
    }
}

impl From<SessionMessage> for SessionEvent {
    fn from(msg: SessionMessage) -> Self {
        match msg {
            SessionMessage::Move { column } => Self::MoveReceived { column },
            SessionMessage::Surrender => Self::SurrenderReceived,
            SessionMessage::RematchVote => Self::RematchVoteReceived,
            SessionMessage::Quit => Self::QuitReceived,
        }
    }
}
