//! The `auth` protocol-data payload exchanged on a connection's first `MESSAGE`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthPayload {
    #[serde(rename = "peerId")]
    pub peer_id: String,
    pub secret: String,
}

impl AuthPayload {
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("AuthPayload always serializes")
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let payload = AuthPayload {
            peer_id: "peer1".to_string(),
            secret: "s3cr3t".to_string(),
        };
        let bytes = payload.to_json_bytes();
        assert_eq!(AuthPayload::from_json_bytes(&bytes).unwrap(), payload);
    }
}
