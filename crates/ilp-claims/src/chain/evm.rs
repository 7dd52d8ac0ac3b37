//! EVM payment channels: EIP-712 typed-data claims, signed and recovered via `alloy`.

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::sol_types::{eip712_domain, sol, Eip712Domain, SolStruct};

use async_trait::async_trait;

use crate::claim::{Chain, Claim};
use crate::error::ClaimError;
use crate::provider::ChainClaimProvider;

sol! {
    struct ClaimMessage {
        string channelId;
        uint256 amount;
        uint256 nonce;
    }
}

pub struct EvmClaimProvider {
    signer: PrivateKeySigner,
    domain: Eip712Domain,
}

impl EvmClaimProvider {
    pub fn new(signer: PrivateKeySigner, chain_id: u64, verifying_contract: Address) -> Self {
        let domain = eip712_domain! {
            name: "IlpConnectorClaim",
            version: "1",
            chain_id: chain_id,
            verifying_contract: verifying_contract,
        };
        Self { signer, domain }
    }

    fn message(channel_id: &str, amount: u64, nonce: u64) -> ClaimMessage {
        ClaimMessage {
            channelId: channel_id.to_string(),
            amount: U256::from(amount),
            nonce: U256::from(nonce),
        }
    }
}

#[async_trait]
impl ChainClaimProvider for EvmClaimProvider {
    fn chain(&self) -> Chain {
        Chain::Evm
    }

    async fn sign(&self, channel_id: &str, amount: u64, nonce: Option<u64>) -> Result<Vec<u8>, ClaimError> {
        let nonce = nonce.ok_or_else(|| ClaimError::SigningFailed("EVM claims require a nonce".to_string()))?;
        let message = Self::message(channel_id, amount, nonce);
        let signing_hash = message.eip712_signing_hash(&self.domain);
        let signature = self
            .signer
            .sign_hash(&signing_hash)
            .await
            .map_err(|e| ClaimError::SigningFailed(e.to_string()))?;
        Ok(signature.as_bytes().to_vec())
    }

    fn verify(&self, claim: &Claim, expected_signer: &str) -> Result<bool, ClaimError> {
        let nonce = claim.nonce.ok_or(ClaimError::SignatureInvalid)?;
        let message = Self::message(&claim.channel_id, claim.amount, nonce);
        let signing_hash = message.eip712_signing_hash(&self.domain);

        let sig_bytes: [u8; 65] = claim
            .signature
            .clone()
            .try_into()
            .map_err(|_| ClaimError::SignatureInvalid)?;
        let signature = alloy::primitives::Signature::try_from(&sig_bytes[..])
            .map_err(|_| ClaimError::SignatureInvalid)?;

        let recovered = signature
            .recover_address_from_prehash(&signing_hash)
            .map_err(|_| ClaimError::SignatureInvalid)?;
        let expected: Address = expected_signer
            .parse()
            .map_err(|_| ClaimError::SignatureInvalid)?;

        Ok(recovered.to_checksum(None).to_lowercase() == expected.to_checksum(None).to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> (EvmClaimProvider, PrivateKeySigner) {
        let signer = PrivateKeySigner::random();
        let provider = EvmClaimProvider::new(signer.clone(), 1, Address::ZERO);
        (provider, signer)
    }

    #[tokio::test]
    async fn signs_and_verifies_own_claim() {
        let (provider, signer) = provider();
        let signature = provider.sign("channel-1", 1000, Some(5)).await.unwrap();
        let claim = Claim {
            peer_id: "peer1".to_string(),
            chain: Chain::Evm,
            channel_id: "channel-1".to_string(),
            amount: 1000,
            nonce: Some(5),
            signature,
        };
        let address = signer.address().to_checksum(None);
        assert!(provider.verify(&claim, &address).unwrap());
    }

    #[tokio::test]
    async fn rejects_claim_with_no_nonce() {
        let (provider, _signer) = provider();
        assert!(provider.sign("channel-1", 1000, None).await.is_err());
    }

    #[tokio::test]
    async fn rejects_tampered_amount() {
        let (provider, signer) = provider();
        let signature = provider.sign("channel-1", 1000, Some(5)).await.unwrap();
        let tampered = Claim {
            peer_id: "peer1".to_string(),
            chain: Chain::Evm,
            channel_id: "channel-1".to_string(),
            amount: 2000,
            nonce: Some(5),
            signature,
        };
        let address = signer.address().to_checksum(None);
        assert!(!provider.verify(&tampered, &address).unwrap());
    }
}
