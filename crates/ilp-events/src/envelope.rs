//! The wire envelope carried inside an ILP Prepare/Fulfill `data` field:
//! an application payload plus zero or one signed settlement claim.

use ilp_claims::Claim;
use serde::{Deserialize, Serialize};

use crate::event::NostrEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimEventEnvelope {
    pub content: NostrEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<Claim>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("failed to decode claim event envelope: {0}")]
    Decode(#[from] serde_json::Error),
}

pub fn encode(envelope: &ClaimEventEnvelope) -> Result<Vec<u8>, EnvelopeError> {
    Ok(serde_json::to_vec(envelope)?)
}

pub fn decode(bytes: &[u8]) -> Result<ClaimEventEnvelope, EnvelopeError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilp_claims::Chain;

    fn sample_event() -> NostrEvent {
        NostrEvent {
            id: "abc".to_string(),
            author: "peer1".to_string(),
            kind: 1,
            created_at: 1_700_000_000,
            tags: vec![vec!["e".to_string(), "other-event".to_string()]],
            content: "hello".to_string(),
        }
    }

    #[test]
    fn round_trips_without_a_claim() {
        let envelope = ClaimEventEnvelope {
            content: sample_event(),
            claim: None,
        };
        let bytes = encode(&envelope).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.content, envelope.content);
        assert!(decoded.claim.is_none());
    }

    #[test]
    fn round_trips_with_a_claim() {
        let claim = Claim {
            peer_id: "peer1".to_string(),
            chain: Chain::Evm,
            channel_id: "chan-1".to_string(),
            amount: 1000,
            nonce: Some(1),
            signature: vec![1, 2, 3],
        };
        let envelope = ClaimEventEnvelope {
            content: sample_event(),
            claim: Some(claim.clone()),
        };
        let bytes = encode(&envelope).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.claim, Some(claim));
    }
}
