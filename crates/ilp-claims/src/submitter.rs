//! On-chain settlement submission: an opaque collaborator represented here
//! only as a trait plus a stub/test-double implementation.

use async_trait::async_trait;

use crate::claim::Claim;
use crate::error::ClaimError;

#[async_trait]
pub trait ChainSubmitter: Send + Sync {
    /// Submit `claim` on-chain and return the resulting transaction hash.
    async fn submit(&self, claim: &Claim) -> Result<String, ClaimError>;
}

/// A submitter that always succeeds with a deterministic fake hash, derived
/// from the claim's identifying fields. Used in tests and in deployments
/// that have not wired a real chain submitter.
pub struct StubSubmitter;

#[async_trait]
impl ChainSubmitter for StubSubmitter {
    async fn submit(&self, claim: &Claim) -> Result<String, ClaimError> {
        Ok(format!(
            "stub-tx-{}-{}-{}",
            claim.peer_id, claim.channel_id, claim.amount
        ))
    }
}

/// A submitter that always fails, for exercising the failure-path telemetry.
pub struct FailingSubmitter {
    pub reason: String,
}

#[async_trait]
impl ChainSubmitter for FailingSubmitter {
    async fn submit(&self, _claim: &Claim) -> Result<String, ClaimError> {
        Err(ClaimError::SubmissionFailed(self.reason.clone()))
    }
}
