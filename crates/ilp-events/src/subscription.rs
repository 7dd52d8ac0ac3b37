//! Per-peer subscription registry backing the messaging gateway's
//! WebSocket push.

use dashmap::DashMap;
use ilp_types::PeerId;

use crate::event::NostrEvent;
use crate::filter::Filter;

pub const DEFAULT_PER_PEER_CAP: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("peer {peer_id} already has {cap} active subscriptions")]
    CapExceeded { peer_id: PeerId, cap: usize },
}

#[derive(Debug, Clone)]
pub struct Subscription {
    pub peer_id: PeerId,
    pub sub_id: String,
    pub filter: Filter,
}

/// `DashMap<PeerId, DashMap<subId, Filter>>`, enforcing the per-peer
/// subscription cap on `register`.
pub struct SubscriptionManager {
    subs: DashMap<PeerId, DashMap<String, Filter>>,
    per_peer_cap: usize,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PEER_CAP)
    }
}

impl SubscriptionManager {
    pub fn new(per_peer_cap: usize) -> Self {
        Self {
            subs: DashMap::new(),
            per_peer_cap,
        }
    }

    /// Replaces an existing `(peerId, subId)`. Only a *new* subId counts
    /// against the cap; re-registering an existing one is always allowed.
    pub fn register(&self, peer_id: PeerId, sub_id: String, filter: Filter) -> Result<(), SubscriptionError> {
        let peer_subs = self.subs.entry(peer_id.clone()).or_default();
        if !peer_subs.contains_key(&sub_id) && peer_subs.len() >= self.per_peer_cap {
            return Err(SubscriptionError::CapExceeded {
                peer_id,
                cap: self.per_peer_cap,
            });
        }
        peer_subs.insert(sub_id, filter);
        Ok(())
    }

    pub fn unregister(&self, peer_id: &str, sub_id: &str) {
        if let Some(peer_subs) = self.subs.get(peer_id) {
            peer_subs.remove(sub_id);
        }
    }

    pub fn unregister_all_for_peer(&self, peer_id: &str) {
        self.subs.remove(peer_id);
    }

    /// Sub ids belonging to `peer_id` whose filter matches `event`.
    pub fn matching_for_peer(&self, peer_id: &str, event: &NostrEvent) -> Vec<String> {
        match self.subs.get(peer_id) {
            Some(peer_subs) => peer_subs
                .iter()
                .filter(|entry| entry.value().matches(event))
                .map(|entry| entry.key().clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every subscription whose filter matches `event`, across all peers.
    pub fn matching(&self, event: &NostrEvent) -> Vec<Subscription> {
        let mut matched = Vec::new();
        for peer_entry in self.subs.iter() {
            let peer_id = peer_entry.key().clone();
            for sub_entry in peer_entry.value().iter() {
                if sub_entry.value().matches(event) {
                    matched.push(Subscription {
                        peer_id: peer_id.clone(),
                        sub_id: sub_entry.key().clone(),
                        filter: sub_entry.value().clone(),
                    });
                }
            }
        }
        matched
    }
}
