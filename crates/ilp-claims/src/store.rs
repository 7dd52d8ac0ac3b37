//! Claim persistence: one slot per `(peerId, chain, channelId)`, serialized
//! writes enforcing the monotonicity invariant as a logical compare-and-swap.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ilp_types::PeerId;

use crate::claim::{Chain, Claim};
use crate::error::ClaimError;

type Key = (PeerId, Chain, String);

#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Store `claim` iff it is strictly newer than whatever is currently
    /// persisted for its `(peerId, chain, channelId)` (or nothing is yet
    /// persisted). Returns whether the claim was accepted.
    async fn try_store(&self, claim: Claim) -> Result<bool, ClaimError>;

    async fn latest(&self, peer_id: &str, chain: Chain, channel_id: &str) -> Option<Claim>;
}

/// In-memory reference implementation backed by `DashMap`. Per-key writes
/// are serialized by the map's own shard locking, which is the only
/// serialization the monotonicity check needs — no additional lock required.
#[derive(Default)]
pub struct MemoryClaimStore {
    claims: DashMap<Key, Claim>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self {
            claims: DashMap::new(),
        }
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn try_store(&self, claim: Claim) -> Result<bool, ClaimError> {
        let key = (claim.peer_id.clone(), claim.chain, claim.channel_id.clone());
        match self.claims.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(claim);
                Ok(true)
            }
            Entry::Occupied(mut slot) => {
                if claim.monotonic_value() > slot.get().monotonic_value() {
                    slot.insert(claim);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    async fn latest(&self, peer_id: &str, chain: Chain, channel_id: &str) -> Option<Claim> {
        self.claims
            .get(&(peer_id.to_string(), chain, channel_id.to_string()))
            .map(|e| e.value().clone())
    }
}
