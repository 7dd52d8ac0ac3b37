//! Peer lifecycle state shared between the admin surface and the BTP fabric.

use chrono::{DateTime, Utc};

use crate::route::PeerId;

/// A configured BTP peer and its last-observed connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: PeerId,
    pub url: String,
    pub auth_token: String,
    pub state: PeerConnectionState,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Peer {
    pub fn new(id: impl Into<PeerId>, url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            auth_token: auth_token.into(),
            state: PeerConnectionState::Disconnected,
            last_seen: None,
        }
    }
}

/// Per-connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    Disconnected,
    Dialing,
    Connected,
    Authenticated,
}
