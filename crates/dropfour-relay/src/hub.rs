//! Channel registry: who is in which channel, and how to reach them.
//!
//! The hub is owned by the server state behind a mutex and never does
//! I/O itself. Every connection handler registers an outbound queue per
//! joined channel; fan-out is a push onto those queues.

use std::collections::{BTreeMap, HashMap};

use dropfour_protocol::RelayFrame;
use dropfour_transport::{ChannelId, PeerId};
use tokio::sync::mpsc;

use crate::RelayError;

/// Queue feeding one connection's writer.
pub(crate) type Outbound = mpsc::UnboundedSender<RelayFrame>;

/// Tracks channel membership for every connected peer.
#[derive(Default)]
pub(crate) struct Hub {
    /// Members of each non-empty channel.
    channels: HashMap<ChannelId, BTreeMap<PeerId, Outbound>>,
}

impl Hub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `peer` to `channel`. The joiner hears about everyone already
    /// present, and everyone present hears about the joiner.
    pub(crate) fn join(
        &mut self,
        channel: &ChannelId,
        peer: PeerId,
        outbound: Outbound,
    ) -> Result<(), RelayError> {
        let members = self.channels.entry(channel.clone()).or_default();
        if members.contains_key(&peer) {
            return Err(RelayError::AlreadyJoined {
                channel: channel.clone(),
                peer,
            });
        }

        for (existing, tx) in members.iter() {
            let _ = tx.send(RelayFrame::PeerJoined {
                channel: channel.clone(),
                peer,
            });
            let _ = outbound.send(RelayFrame::PeerJoined {
                channel: channel.clone(),
                peer: *existing,
            });
        }
        members.insert(peer, outbound);
        tracing::debug!(%peer, %channel, members = members.len(), "peer joined channel");
        Ok(())
    }

    /// Removes `peer` from `channel`. Returns `false` if it was not there.
    pub(crate) fn leave(&mut self, channel: &ChannelId, peer: PeerId) -> bool {
        let Some(members) = self.channels.get_mut(channel) else {
            return false;
        };
        if members.remove(&peer).is_none() {
            return false;
        }
        for tx in members.values() {
            let _ = tx.send(RelayFrame::PeerLeft {
                channel: channel.clone(),
                peer,
            });
        }
        if members.is_empty() {
            self.channels.remove(channel);
        }
        tracing::debug!(%peer, %channel, "peer left channel");
        true
    }

    /// Delivers an action to every other member, or only to `target`.
    /// A target that is not present is dropped silently.
    pub(crate) fn send(
        &self,
        channel: &ChannelId,
        from: PeerId,
        action: String,
        payload: Vec<u8>,
        target: Option<PeerId>,
    ) -> Result<(), RelayError> {
        let members = self
            .channels
            .get(channel)
            .filter(|members| members.contains_key(&from))
            .ok_or_else(|| RelayError::NotJoined {
                channel: channel.clone(),
                peer: from,
            })?;

        let frame = RelayFrame::Action {
            channel: channel.clone(),
            action,
            payload,
            from,
        };
        match target {
            Some(target) if target != from => {
                if let Some(tx) = members.get(&target) {
                    let _ = tx.send(frame);
                }
            }
            Some(_) => {}
            None => {
                for (peer, tx) in members {
                    if *peer != from {
                        let _ = tx.send(frame.clone());
                    }
                }
            }
        }
        Ok(())
    }

    /// Removes `peer` from every channel it joined. Returns how many.
    pub(crate) fn disconnect(&mut self, peer: PeerId) -> usize {
        let joined: Vec<ChannelId> = self
            .channels
            .iter()
            .filter(|(_, members)| members.contains_key(&peer))
            .map(|(channel, _)| channel.clone())
            .collect();
        for channel in &joined {
            self.leave(channel, peer);
        }
        joined.len()
    }

    /// Number of members in `channel`.
    pub(crate) fn member_count(&self, channel: &ChannelId) -> usize {
        self.channels.get(channel).map_or(0, BTreeMap::len)
    }
}
