//! BTP peering fabric: frame codec, auth handshake, request correlation,
//! reconnect policy, and the WebSocket transport binding.

pub mod auth;
pub mod connection;
pub mod error;
pub mod frame;
pub mod manager;
pub mod reconnect;
pub mod registry;
pub mod server;
pub mod transport;

pub use auth::AuthPayload;
pub use connection::{default_request_timeout, PeerConnection};
pub use error::BtpError;
pub use frame::{BtpFrame, ProtocolData, FRAME_TYPE_ERROR, FRAME_TYPE_MESSAGE, FRAME_TYPE_RESPONSE};
pub use manager::{InboundPrepareHandler, PeerManager};
pub use reconnect::Backoff;
pub use registry::PeerRegistry;
