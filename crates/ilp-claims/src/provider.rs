//! The per-chain signer interface claim generation and verification delegate to.
//!
//! Each chain family gets its own module implementing this shared trait
//! rather than one branching god-object.

use async_trait::async_trait;

use crate::claim::{Chain, Claim};
use crate::error::ClaimError;

#[async_trait]
pub trait ChainClaimProvider: Send + Sync {
    fn chain(&self) -> Chain;

    /// Sign a new claim body, returning the raw signature bytes.
    async fn sign(&self, channel_id: &str, amount: u64, nonce: Option<u64>) -> Result<Vec<u8>, ClaimError>;

    /// Verify `claim.signature` was produced by `expected_signer` over the
    /// claim body. Address/key comparison is case-insensitive for EVM,
    /// exact for XRP/Aptos public keys — see each chain module.
    fn verify(&self, claim: &Claim, expected_signer: &str) -> Result<bool, ClaimError>;
}
