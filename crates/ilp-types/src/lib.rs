//! Core ILP data model shared by the codec, routing, BTP, and packet-handler crates.
//!
//! This crate has no async runtime dependency and no I/O: it defines the
//! value types (addresses, packets, routes, peers) and the error taxonomy
//! that the rest of the connector builds on.

pub mod address;
pub mod error;
pub mod packet;
pub mod peer;
pub mod route;

pub use address::{AddressError, IlpAddress};
pub use error::{CodecError, ErrorCategory, IlpErrorCode};
pub use packet::{Fulfill, IlpFulfillment, IlpPacket, Prepare, Reject};
pub use peer::{Peer, PeerConnectionState};
pub use route::{PeerId, Route};
