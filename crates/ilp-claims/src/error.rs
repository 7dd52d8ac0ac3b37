//! Claim-domain errors. None of these ever reach the packet path — the
//! manager logs them and degrades gracefully.

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClaimError {
    #[error("chain {0:?} is not configured with a signer")]
    ChainNotConfigured(crate::claim::Chain),
    #[error("claim signature is invalid")]
    SignatureInvalid,
    #[error("claim is stale: not strictly greater than the stored claim")]
    StaleNonce,
    #[error("claim amount exceeds the on-chain channel deposit")]
    AmountExceedsDeposit,
    #[error("store write failed: {0}")]
    StoreWriteFailure(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("no stored claim available")]
    NoStoredClaim,
    #[error("settlement submission failed: {0}")]
    SubmissionFailed(String),
}
