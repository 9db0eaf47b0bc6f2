//! In-process substrate: every participant lives in the same process and
//! channels are plain `mpsc` fan-out.
//!
//! This is the test double for everything above the transport layer, and
//! also what local hot-seat play runs on.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::{
    Channel, ChannelEvent, ChannelEvents, ChannelId, PeerId, Substrate, TransportError,
};

type Members = BTreeMap<PeerId, mpsc::UnboundedSender<ChannelEvent>>;

#[derive(Default)]
struct Hub {
    next_peer: AtomicU64,
    channels: Mutex<HashMap<ChannelId, Members>>,
}

/// A shared in-process network. Cheap to clone; all clones are one network.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    hub: Arc<Hub>,
}

impl MemoryNetwork {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new participant with a fresh peer id.
    pub fn peer(&self) -> MemoryPeer {
        let id = PeerId(self.hub.next_peer.fetch_add(1, Ordering::Relaxed) + 1);
        MemoryPeer {
            id,
            network: self.clone(),
        }
    }

    /// Number of peers currently in `channel`.
    pub fn member_count(&self, channel: &ChannelId) -> usize {
        self.channels().get(channel).map_or(0, BTreeMap::len)
    }

    /// Drops `peer` from every channel at once, the way a crashed process
    /// or a dead connection would. Remaining members observe `PeerLeft`.
    pub fn disconnect(&self, peer: PeerId) {
        let mut channels = self.channels();
        for members in channels.values_mut() {
            if members.remove(&peer).is_some() {
                notify(members, ChannelEvent::PeerLeft(peer));
            }
        }
        channels.retain(|_, members| !members.is_empty());
        tracing::debug!(%peer, "memory peer disconnected");
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<ChannelId, Members>> {
        // A poisoned lock only means another test thread panicked while
        // holding it; the map itself is still consistent.
        self.hub
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove_member(&self, channel: &ChannelId, peer: PeerId) -> bool {
        let mut channels = self.channels();
        let Some(members) = channels.get_mut(channel) else {
            return false;
        };
        if members.remove(&peer).is_none() {
            return false;
        }
        notify(members, ChannelEvent::PeerLeft(peer));
        if members.is_empty() {
            channels.remove(channel);
        }
        true
    }
}

fn notify(members: &Members, event: ChannelEvent) {
    for tx in members.values() {
        // A dropped receiver just means that member stopped listening.
        let _ = tx.send(event.clone());
    }
}

/// One participant on a [`MemoryNetwork`].
#[derive(Clone)]
pub struct MemoryPeer {
    id: PeerId,
    network: MemoryNetwork,
}

impl MemoryPeer {
    /// This participant's peer id.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// The network this participant belongs to.
    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }
}

impl Substrate for MemoryPeer {
    type Channel = MemoryChannel;

    async fn join(
        &self,
        channel: &ChannelId,
    ) -> Result<(MemoryChannel, ChannelEvents), TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut channels = self.network.channels();
            let members = channels.entry(channel.clone()).or_default();
            if members.contains_key(&self.id) {
                return Err(TransportError::AlreadyJoined(channel.clone()));
            }
            for (existing, existing_tx) in members.iter() {
                let _ = existing_tx.send(ChannelEvent::PeerJoined(self.id));
                let _ = tx.send(ChannelEvent::PeerJoined(*existing));
            }
            members.insert(self.id, tx);
        }
        tracing::debug!(peer = %self.id, %channel, "joined memory channel");

        Ok((
            MemoryChannel {
                id: channel.clone(),
                peer: self.id,
                network: self.network.clone(),
            },
            rx,
        ))
    }
}

/// A joined channel on a [`MemoryNetwork`]. Dropping the handle leaves.
pub struct MemoryChannel {
    id: ChannelId,
    peer: PeerId,
    network: MemoryNetwork,
}

impl Channel for MemoryChannel {
    async fn broadcast(
        &self,
        action: &str,
        payload: &[u8],
        target: Option<PeerId>,
    ) -> Result<(), TransportError> {
        let channels = self.network.channels();
        let members = channels
            .get(&self.id)
            .filter(|members| members.contains_key(&self.peer))
            .ok_or_else(|| TransportError::NotJoined(self.id.clone()))?;

        let event = ChannelEvent::Action {
            name: action.to_string(),
            payload: payload.to_vec(),
            from: self.peer,
        };
        match target {
            Some(target) => {
                if let Some(tx) = members.get(&target).filter(|_| target != self.peer) {
                    let _ = tx.send(event);
                }
            }
            None => {
                for (peer, tx) in members {
                    if *peer != self.peer {
                        let _ = tx.send(event.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn leave(&self) -> Result<(), TransportError> {
        if self.network.remove_member(&self.id, self.peer) {
            tracing::debug!(peer = %self.peer, channel = %self.id, "left memory channel");
        }
        Ok(())
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    fn local_peer(&self) -> PeerId {
        self.peer
    }
}

impl Drop for MemoryChannel {
    fn drop(&mut self) {
        self.network.remove_member(&self.id, self.peer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> ChannelId {
        ChannelId::new("lobby")
    }

    #[tokio::test]
    async fn test_join_announces_existing_and_new_members() {
        let net = MemoryNetwork::new();
        let a = net.peer();
        let b = net.peer();

        let (_ca, mut ea) = a.join(&lobby()).await.unwrap();
        let (_cb, mut eb) = b.join(&lobby()).await.unwrap();

        assert_eq!(ea.recv().await, Some(ChannelEvent::PeerJoined(b.id())));
        assert_eq!(eb.recv().await, Some(ChannelEvent::PeerJoined(a.id())));
        assert_eq!(net.member_count(&lobby()), 2);
    }

    #[tokio::test]
    async fn test_join_twice_returns_already_joined() {
        let net = MemoryNetwork::new();
        let a = net.peer();
        let (_c, _e) = a.join(&lobby()).await.unwrap();

        let result = a.join(&lobby()).await;

        assert!(matches!(result, Err(TransportError::AlreadyJoined(_))));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone_but_sender() {
        let net = MemoryNetwork::new();
        let (a, b, c) = (net.peer(), net.peer(), net.peer());
        let (ca, mut ea) = a.join(&lobby()).await.unwrap();
        let (_cb, mut eb) = b.join(&lobby()).await.unwrap();
        let (_cc, mut ec) = c.join(&lobby()).await.unwrap();
        // drain presence events
        while let Ok(ChannelEvent::PeerJoined(_)) = ea.try_recv() {}
        while let Ok(ChannelEvent::PeerJoined(_)) = eb.try_recv() {}
        while let Ok(ChannelEvent::PeerJoined(_)) = ec.try_recv() {}

        ca.broadcast("ping", b"hi", None).await.unwrap();

        let expected = ChannelEvent::Action {
            name: "ping".into(),
            payload: b"hi".to_vec(),
            from: a.id(),
        };
        assert_eq!(eb.recv().await, Some(expected.clone()));
        assert_eq!(ec.recv().await, Some(expected));
        assert!(ea.try_recv().is_err(), "sender must not hear itself");
    }

    #[tokio::test]
    async fn test_broadcast_with_target_reaches_only_target() {
        let net = MemoryNetwork::new();
        let (a, b, c) = (net.peer(), net.peer(), net.peer());
        let (ca, _ea) = a.join(&lobby()).await.unwrap();
        let (_cb, mut eb) = b.join(&lobby()).await.unwrap();
        let (_cc, mut ec) = c.join(&lobby()).await.unwrap();
        while let Ok(ChannelEvent::PeerJoined(_)) = eb.try_recv() {}
        while let Ok(ChannelEvent::PeerJoined(_)) = ec.try_recv() {}

        ca.broadcast("accept", b"x", Some(c.id())).await.unwrap();

        assert!(matches!(ec.recv().await, Some(ChannelEvent::Action { .. })));
        assert!(eb.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_preserves_per_sender_order() {
        let net = MemoryNetwork::new();
        let (a, b) = (net.peer(), net.peer());
        let (ca, _ea) = a.join(&lobby()).await.unwrap();
        let (_cb, mut eb) = b.join(&lobby()).await.unwrap();
        let _ = eb.recv().await; // PeerJoined(a)

        for i in 0..5u8 {
            ca.broadcast("n", &[i], None).await.unwrap();
        }

        for i in 0..5u8 {
            match eb.recv().await {
                Some(ChannelEvent::Action { payload, .. }) => assert_eq!(payload, vec![i]),
                other => panic!("expected action, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_leave_notifies_remaining_and_is_idempotent() {
        let net = MemoryNetwork::new();
        let (a, b) = (net.peer(), net.peer());
        let (ca, _ea) = a.join(&lobby()).await.unwrap();
        let (_cb, mut eb) = b.join(&lobby()).await.unwrap();
        let _ = eb.recv().await;

        ca.leave().await.unwrap();
        ca.leave().await.unwrap();

        assert_eq!(eb.recv().await, Some(ChannelEvent::PeerLeft(a.id())));
        assert!(eb.try_recv().is_err(), "second leave must not re-notify");
        assert!(matches!(
            ca.broadcast("x", b"", None).await,
            Err(TransportError::NotJoined(_))
        ));
    }

    #[tokio::test]
    async fn test_drop_channel_leaves() {
        let net = MemoryNetwork::new();
        let (a, b) = (net.peer(), net.peer());
        let (ca, _ea) = a.join(&lobby()).await.unwrap();
        let (_cb, mut eb) = b.join(&lobby()).await.unwrap();
        let _ = eb.recv().await;

        drop(ca);

        assert_eq!(eb.recv().await, Some(ChannelEvent::PeerLeft(a.id())));
        assert_eq!(net.member_count(&lobby()), 1);
    }

    #[tokio::test]
    async fn test_disconnect_leaves_every_channel() {
        let net = MemoryNetwork::new();
        let (a, b) = (net.peer(), net.peer());
        let room = ChannelId::new("room");
        let (_ca1, _) = a.join(&lobby()).await.unwrap();
        let (_ca2, _) = a.join(&room).await.unwrap();
        let (_cb, mut eb) = b.join(&room).await.unwrap();
        let _ = eb.recv().await;

        net.disconnect(a.id());

        assert_eq!(eb.recv().await, Some(ChannelEvent::PeerLeft(a.id())));
        assert_eq!(net.member_count(&lobby()), 0);
        assert_eq!(net.member_count(&room), 1);
    }
}
