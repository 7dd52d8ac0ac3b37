//! Aptos payment channels: Ed25519 claims signed over a BCS-serialized body.

use async_trait::async_trait;
use ed25519_dalek::{Signature, SigningKey, Verifier, VerifyingKey};
use serde::Serialize;

use crate::claim::{Chain, Claim};
use crate::error::ClaimError;
use crate::provider::ChainClaimProvider;

#[derive(Serialize)]
struct ClaimBody<'a> {
    channel_id: &'a str,
    amount: u64,
    nonce: u64,
}

fn claim_message(channel_id: &str, amount: u64, nonce: u64) -> Result<Vec<u8>, ClaimError> {
    bcs::to_bytes(&ClaimBody {
        channel_id,
        amount,
        nonce,
    })
    .map_err(|e| ClaimError::SigningFailed(e.to_string()))
}

pub struct AptosClaimProvider {
    signing_key: SigningKey,
}

impl AptosClaimProvider {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }
}

#[async_trait]
impl ChainClaimProvider for AptosClaimProvider {
    fn chain(&self) -> Chain {
        Chain::Aptos
    }

    async fn sign(&self, channel_id: &str, amount: u64, nonce: Option<u64>) -> Result<Vec<u8>, ClaimError> {
        let nonce = nonce.ok_or_else(|| ClaimError::SigningFailed("Aptos claims require a nonce".to_string()))?;
        let message = claim_message(channel_id, amount, nonce)?;
        Ok(self.signing_key.sign(&message).to_bytes().to_vec())
    }

    fn verify(&self, claim: &Claim, expected_signer: &str) -> Result<bool, ClaimError> {
        let nonce = claim.nonce.ok_or(ClaimError::SignatureInvalid)?;
        let key_bytes = hex::decode(expected_signer).map_err(|_| ClaimError::SignatureInvalid)?;
        let key_array: [u8; 32] = key_bytes.try_into().map_err(|_| ClaimError::SignatureInvalid)?;
        let verifying_key = VerifyingKey::from_bytes(&key_array).map_err(|_| ClaimError::SignatureInvalid)?;

        let sig_bytes: [u8; 64] = claim
            .signature
            .clone()
            .try_into()
            .map_err(|_| ClaimError::SignatureInvalid)?;
        let signature = Signature::from_bytes(&sig_bytes);

        let message = claim_message(&claim.channel_id, claim.amount, nonce)?;
        Ok(verifying_key.verify(&message, &signature).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use rand_core::OsRng;

    #[tokio::test]
    async fn signs_and_verifies_own_claim() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key_hex = hex::encode(signing_key.verifying_key().to_bytes());
        let provider = AptosClaimProvider::new(signing_key);

        let signature = provider.sign("channel-1", 500, Some(3)).await.unwrap();
        let claim = Claim {
            peer_id: "peer1".to_string(),
            chain: Chain::Aptos,
            channel_id: "channel-1".to_string(),
            amount: 500,
            nonce: Some(3),
            signature,
        };
        assert!(provider.verify(&claim, &verifying_key_hex).unwrap());
    }

    #[tokio::test]
    async fn rejects_claim_with_no_nonce() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let provider = AptosClaimProvider::new(signing_key);
        assert!(provider.sign("channel-1", 500, None).await.is_err());
    }
}
