//! Bit-exact Octet Encoding Rules (OER) codec for ILPv4 packets.
//!
//! This crate has no knowledge of routing, transport, or settlement — it only
//! converts between [`ilp_types::IlpPacket`] values and their wire bytes.

pub mod packet;
pub mod primitives;
pub mod reader;

pub use packet::{deserialize_packet, serialize, serialize_fulfill, serialize_prepare, serialize_reject};
pub use reader::Reader;
