//! The three ILPv4 packet types: Prepare, Fulfill, Reject.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::address::IlpAddress;

/// Maximum length of a Prepare packet's `data` field.
pub const MAX_DATA_LEN: usize = 32 * 1024;

/// Wire type tags.
pub const PACKET_TYPE_PREPARE: u8 = 12;
pub const PACKET_TYPE_FULFILL: u8 = 13;
pub const PACKET_TYPE_REJECT: u8 = 14;

/// An ILPv4 Prepare packet: the forward-going conditional transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepare {
    pub amount: u64,
    pub expires_at: DateTime<Utc>,
    /// SHA-256 preimage commitment; exactly 32 bytes.
    pub execution_condition: [u8; 32],
    pub destination: IlpAddress,
    pub data: Bytes,
}

impl Prepare {
    /// Whether `now` is at or past this packet's expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// An ILPv4 Fulfill packet: proof of condition satisfaction plus response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfill {
    /// 32-byte preimage such that `SHA256(fulfillment) == execution_condition`.
    pub fulfillment: [u8; 32],
    pub data: Bytes,
}

impl Fulfill {
    /// SHA-256 of the fulfillment, for matching against a Prepare's execution condition.
    pub fn condition(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.fulfillment);
        hasher.finalize().into()
    }

    pub fn satisfies(&self, execution_condition: &[u8; 32]) -> bool {
        &self.condition() == execution_condition
    }
}

/// An ILPv4 Reject packet: the structured failure response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reject {
    /// Exactly 3 ASCII characters: a category letter (F/T/R) plus two digits.
    pub code: String,
    /// ILP address of the node that generated the rejection, or empty.
    pub triggered_by: String,
    pub message: String,
    pub data: Bytes,
}

impl Reject {
    pub fn new(
        code: impl Into<String>,
        triggered_by: impl Into<String>,
        message: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            code: code.into(),
            triggered_by: triggered_by.into(),
            message: message.into(),
            data: data.into(),
        }
    }
}

/// A decoded ILP packet of any of the three kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IlpPacket {
    Prepare(Prepare),
    Fulfill(Fulfill),
    Reject(Reject),
}

/// The outcome of executing a Prepare: either it was fulfilled, or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IlpFulfillment {
    Fulfill(Fulfill),
    Reject(Reject),
}

impl From<Fulfill> for IlpFulfillment {
    fn from(value: Fulfill) -> Self {
        Self::Fulfill(value)
    }
}

impl From<Reject> for IlpFulfillment {
    fn from(value: Reject) -> Self {
        Self::Reject(value)
    }
}
