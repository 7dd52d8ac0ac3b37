//! The chain-tagged signed claim, closed over the three supported chain families.

use ilp_types::PeerId;
use serde::{Deserialize, Serialize};

/// Which on-chain payment-channel family a claim is anchored to.
///
/// A closed sum type rather than an open/extensible registry: every variant
/// gets its own monotonicity rule and signature scheme, enumerated directly
/// on this type instead of behind dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Evm,
    Xrp,
    Aptos,
}

/// A signed statement of cumulative value owed through a payment channel.
///
/// `nonce` is required for EVM/Aptos (monotonic counter) and ignored for XRP,
/// which instead treats `amount` itself as the monotonic quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub peer_id: PeerId,
    pub chain: Chain,
    /// Canonicalized per chain: lowercase hex for XRP (see DESIGN.md), the
    /// chain's native representation otherwise.
    pub channel_id: String,
    pub amount: u64,
    pub nonce: Option<u64>,
    pub signature: Vec<u8>,
}

impl Claim {
    /// The value this claim's monotonicity is judged on: `nonce` for
    /// EVM/Aptos, `amount` for XRP.
    pub fn monotonic_value(&self) -> u64 {
        match self.chain {
            Chain::Evm | Chain::Aptos => self.nonce.unwrap_or(0),
            Chain::Xrp => self.amount,
        }
    }
}
