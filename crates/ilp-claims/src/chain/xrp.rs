//! XRP Ledger payment channels: Ed25519 claims over `channelId:amount`.
//!
//! XRP channel ids arrive in mixed case from different sources (the ledger's
//! own JSON-RPC responses capitalize them); this provider canonicalizes to
//! lowercase hex before signing, verifying, or storing — see DESIGN.md for
//! why lowercase hex was chosen as the canonical form.

use async_trait::async_trait;
use ed25519_dalek::{Signature, SigningKey, Verifier, VerifyingKey};

use crate::claim::{Chain, Claim};
use crate::error::ClaimError;
use crate::provider::ChainClaimProvider;

/// Lowercase the hex digits of a channel id, tolerating an optional `0x` prefix.
pub fn canonicalize_channel_id(channel_id: &str) -> String {
    channel_id
        .strip_prefix("0x")
        .unwrap_or(channel_id)
        .to_ascii_lowercase()
}

fn claim_message(channel_id: &str, amount: u64) -> Vec<u8> {
    format!("{}:{}", canonicalize_channel_id(channel_id), amount).into_bytes()
}

pub struct XrpClaimProvider {
    signing_key: SigningKey,
}

impl XrpClaimProvider {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }
}

#[async_trait]
impl ChainClaimProvider for XrpClaimProvider {
    fn chain(&self) -> Chain {
        Chain::Xrp
    }

    async fn sign(&self, channel_id: &str, amount: u64, _nonce: Option<u64>) -> Result<Vec<u8>, ClaimError> {
        let message = claim_message(channel_id, amount);
        let signature = self.signing_key.sign(&message);
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, claim: &Claim, expected_signer: &str) -> Result<bool, ClaimError> {
        let verifying_key_bytes =
            hex::decode(expected_signer).map_err(|e| ClaimError::SigningFailed(e.to_string()))?;
        let key_array: [u8; 32] = verifying_key_bytes
            .try_into()
            .map_err(|_| ClaimError::SignatureInvalid)?;
        let verifying_key =
            VerifyingKey::from_bytes(&key_array).map_err(|_| ClaimError::SignatureInvalid)?;

        let sig_bytes: [u8; 64] = claim
            .signature
            .clone()
            .try_into()
            .map_err(|_| ClaimError::SignatureInvalid)?;
        let signature = Signature::from_bytes(&sig_bytes);

        let message = claim_message(&claim.channel_id, claim.amount);
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
        let provider = XrpClaimProvider::new(signing_key);

        let signature = provider.sign("0xABCDEF", 1000, None).await.unwrap();
        let claim = Claim {
            peer_id: "peer1".to_string(),
            chain: Chain::Xrp,
            channel_id: canonicalize_channel_id("0xABCDEF"),
            amount: 1000,
            nonce: None,
            signature,
        };
        assert!(provider.verify(&claim, &verifying_key_hex).unwrap());
    }

    #[test]
    fn canonicalizes_mixed_case_and_0x_prefix() {
        assert_eq!(canonicalize_channel_id("0xABCDEF"), "abcdef");
        assert_eq!(canonicalize_channel_id("ABCDEF"), "abcdef");
        assert_eq!(canonicalize_channel_id("abcdef"), "abcdef");
    }
}
