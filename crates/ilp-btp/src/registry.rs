//! The fabric's set of known peers: one [`PeerConnection`] per configured peer id.

use std::sync::Arc;

use dashmap::DashMap;
use ilp_types::PeerId;

use crate::connection::PeerConnection;

/// Owns every peer's connection state. The packet handler and admin surface
/// both read through this; only the fabric's own connect/accept paths insert
/// or replace entries.
#[derive(Default)]
pub struct PeerRegistry {
    peers: DashMap<PeerId, Arc<PeerConnection>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
        }
    }

    pub fn insert(&self, conn: Arc<PeerConnection>) {
        self.peers.insert(conn.id.clone(), conn);
    }

    pub fn get(&self, id: &str) -> Option<Arc<PeerConnection>> {
        self.peers.get(id).map(|e| e.clone())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.peers.remove(id).is_some()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.iter().map(|e| e.key().clone()).collect()
    }
}
