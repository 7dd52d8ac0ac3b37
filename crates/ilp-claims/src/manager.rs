//! The Claim Manager: generation, verification, storage, and settlement
//! dispatch for signed claims.
//!
//! No operation here raises into the packet path — every failure is logged
//! and turned into `None`/`false`/a collected error instead.

use std::collections::HashMap;
use std::sync::Arc;

use ilp_types::PeerId;
use tracing::{error, warn};

use crate::claim::{Chain, Claim};
use crate::provider::ChainClaimProvider;
use crate::store::ClaimStore;
use crate::submitter::ChainSubmitter;

/// An unsigned request, extracted from a received claim event, asking this
/// node to generate and return a claim of its own.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub peer_id: PeerId,
    pub chain: Chain,
    pub channel_id: String,
    pub amount: u64,
    pub nonce: Option<u64>,
}

/// The claim-bearing payload received from a peer over the messaging layer.
#[derive(Debug, Clone, Default)]
pub struct ReceivedClaimEvent {
    pub claims: Vec<Claim>,
    pub claim_requests: Vec<ClaimRequest>,
}

/// The result bundle `processReceivedClaimEvent` returns: everything that
/// happened, with no exceptions thrown along the way.
#[derive(Debug, Clone, Default)]
pub struct ProcessResult {
    pub stored_claims: Vec<Claim>,
    pub claim_requests: Vec<ClaimRequest>,
    pub signed_responses: Vec<Claim>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Success { tx_hash: String },
    Failed { error: String },
}

/// Orchestrates the per-chain providers, the claim store, and the
/// settlement submitters behind a small set of claim operations.
pub struct ClaimManager {
    providers: HashMap<Chain, Arc<dyn ChainClaimProvider>>,
    submitters: HashMap<Chain, Arc<dyn ChainSubmitter>>,
    store: Arc<dyn ClaimStore>,
}

impl ClaimManager {
    pub fn new(
        providers: HashMap<Chain, Arc<dyn ChainClaimProvider>>,
        submitters: HashMap<Chain, Arc<dyn ChainSubmitter>>,
        store: Arc<dyn ClaimStore>,
    ) -> Self {
        Self {
            providers,
            submitters,
            store,
        }
    }

    /// Generate a claim for `peerId`'s channel, or `None` (with a logged
    /// warning) if the chain has no configured signer.
    pub async fn generate_claim(
        &self,
        peer_id: PeerId,
        chain: Chain,
        channel_id: &str,
        amount: u64,
        nonce: Option<u64>,
    ) -> Option<Claim> {
        let Some(provider) = self.providers.get(&chain) else {
            warn!(?chain, %peer_id, "no signer configured for chain, skipping claim generation");
            return None;
        };
        match provider.sign(channel_id, amount, nonce).await {
            Ok(signature) => Some(Claim {
                peer_id,
                chain,
                channel_id: channel_id.to_string(),
                amount,
                nonce,
                signature,
            }),
            Err(e) => {
                warn!(?chain, %peer_id, error = %e, "claim signing failed, skipping claim generation");
                None
            }
        }
    }

    pub fn verify_claim_signature(&self, claim: &Claim, expected_signer: &str) -> bool {
        match self.providers.get(&claim.chain) {
            Some(provider) => provider.verify(claim, expected_signer).unwrap_or_else(|e| {
                warn!(chain = ?claim.chain, error = %e, "claim signature verification failed");
                false
            }),
            None => {
                warn!(chain = ?claim.chain, "no provider configured to verify claim signature");
                false
            }
        }
    }

    /// `true` if no prior claim is stored for this channel, or if `claim` is
    /// strictly greater than the stored one by its chain's monotonic axis.
    pub async fn verify_monotonicity(&self, peer_id: &str, claim: &Claim) -> bool {
        match self.store.latest(peer_id, claim.chain, &claim.channel_id).await {
            Some(stored) => claim.monotonic_value() > stored.monotonic_value(),
            None => true,
        }
    }

    /// A claim whose amount exceeds the on-chain deposit is rejected and
    /// logged at error severity as potential fraud.
    pub fn verify_amount_within_bounds(&self, claim: &Claim, channel_deposit: u64) -> bool {
        if claim.amount > channel_deposit {
            error!(
                peer_id = %claim.peer_id,
                chain = ?claim.chain,
                channel_id = %claim.channel_id,
                amount = claim.amount,
                channel_deposit,
                "claim amount exceeds on-chain deposit, possible fraud"
            );
            false
        } else {
            true
        }
    }

    /// Verify and store every claim in `event`, and sign a response for
    /// every unsigned request it carries. Claim storage is serialized per
    /// `(peerId, chain, channelId)` by the store itself.
    pub async fn process_received_claim_event(
        &self,
        peer_id: &str,
        event: ReceivedClaimEvent,
        peer_addresses: &HashMap<PeerId, String>,
    ) -> ProcessResult {
        let mut result = ProcessResult {
            claim_requests: event.claim_requests.clone(),
            ..Default::default()
        };

        for claim in event.claims {
            let Some(expected_signer) = peer_addresses.get(&claim.peer_id) else {
                result
                    .errors
                    .push(format!("no known signer address for peer {}", claim.peer_id));
                continue;
            };
            if !self.verify_claim_signature(&claim, expected_signer) {
                result.errors.push(format!(
                    "signature-invalid for claim on channel {}",
                    claim.channel_id
                ));
                continue;
            }
            if !self.verify_monotonicity(peer_id, &claim).await {
                result
                    .errors
                    .push(format!("stale-nonce for claim on channel {}", claim.channel_id));
                continue;
            }
            match self.store.try_store(claim.clone()).await {
                Ok(true) => result.stored_claims.push(claim),
                Ok(false) => result
                    .errors
                    .push(format!("stale-nonce for claim on channel {}", claim.channel_id)),
                Err(e) => result.errors.push(format!("store-write-failure: {e}")),
            }
        }

        for request in &result.claim_requests.clone() {
            match self
                .generate_claim(
                    request.peer_id.clone(),
                    request.chain,
                    &request.channel_id,
                    request.amount,
                    request.nonce,
                )
                .await
            {
                Some(claim) => result.signed_responses.push(claim),
                None => result
                    .errors
                    .push(format!("could not sign response for channel {}", request.channel_id)),
            }
        }

        result
    }

    /// Retrieve the latest stored claim and submit it on-chain. The packet
    /// plane is never affected by the outcome.
    pub async fn settle(&self, peer_id: &str, chain: Chain, channel_id: &str, amount: u64) -> SettlementOutcome {
        let Some(claim) = self.store.latest(peer_id, chain, channel_id).await else {
            error!(%peer_id, ?chain, channel_id, event = "CLAIM_SETTLEMENT_FAILED", error = "No stored claim available");
            return SettlementOutcome::Failed {
                error: "No stored claim available".to_string(),
            };
        };

        let Some(submitter) = self.submitters.get(&chain) else {
            error!(%peer_id, ?chain, channel_id, event = "CLAIM_SETTLEMENT_FAILED", error = "no submitter configured for chain");
            return SettlementOutcome::Failed {
                error: "no submitter configured for chain".to_string(),
            };
        };

        let _ = amount; // the amount requested is advisory; the claim on file is authoritative
        match submitter.submit(&claim).await {
            Ok(tx_hash) => {
                tracing::info!(%peer_id, ?chain, channel_id, event = "CLAIM_SETTLEMENT_SUCCESS", %tx_hash);
                SettlementOutcome::Success { tx_hash }
            }
            Err(e) => {
                error!(%peer_id, ?chain, channel_id, event = "CLAIM_SETTLEMENT_FAILED", error = %e);
                SettlementOutcome::Failed { error: e.to_string() }
            }
        }
    }
}
