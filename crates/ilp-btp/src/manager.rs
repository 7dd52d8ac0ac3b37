//! Ties dialing/accepting, the auth handshake, and inbound dispatch together
//! into the peering fabric.
//!
//! Deliberately decoupled from the packet handler: this crate only knows
//! about [`InboundPrepareHandler`], a narrow trait over `ilp-types` values.
//! The binary that wires everything together implements it against
//! `ilp-packet-handler`'s `handle_prepare`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ilp_codec::{deserialize_packet, serialize};
use ilp_types::{IlpFulfillment, IlpPacket, Peer, PeerConnectionState, PeerId, Prepare};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use axum::extract::ws::WebSocket;

use crate::auth::AuthPayload;
use crate::connection::PeerConnection;
use crate::error::BtpError;
use crate::frame::{encode_frame, BtpFrame, ProtocolData, FRAME_TYPE_ERROR, FRAME_TYPE_MESSAGE, FRAME_TYPE_RESPONSE};
use crate::reconnect::Backoff;
use crate::registry::PeerRegistry;
use crate::server::run_inbound_io_loop;
use crate::transport::{dial, run_io_loop};

const AUTH_TIMEOUT: Duration = Duration::from_secs(10);
const AUTH_REQUEST_ID: u32 = 0;

/// Invoked for every inbound Prepare a peer sends us over an authenticated
/// connection.
#[async_trait]
pub trait InboundPrepareHandler: Send + Sync {
    async fn handle_prepare(&self, prepare: Prepare, source_peer: PeerId) -> IlpFulfillment;
}

/// Owns the peer registry and dispatches inbound MESSAGE frames to the
/// configured handler.
pub struct PeerManager {
    registry: Arc<PeerRegistry>,
    handler: Arc<dyn InboundPrepareHandler>,
    high_water_mark: usize,
}

impl PeerManager {
    pub fn new(registry: Arc<PeerRegistry>, handler: Arc<dyn InboundPrepareHandler>, high_water_mark: usize) -> Self {
        Self {
            registry,
            handler,
            high_water_mark,
        }
    }

    /// Dial `peer` and keep reconnecting with exponential backoff until
    /// `shutdown` fires. Runs until cancelled; spawn this as its own task.
    pub async fn run_outbound(&self, peer: Peer, shutdown: CancellationToken) {
        let mut backoff = Backoff::new();
        while !shutdown.is_cancelled() {
            match self.connect_once(&peer).await {
                Ok(()) => backoff.reset(),
                Err(e) => warn!(peer = %peer.id, error = %e, "outbound BTP connection ended"),
            }
            if shutdown.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(backoff.next()) => {}
                _ = shutdown.cancelled() => break,
            }
        }
    }

    async fn connect_once(&self, peer: &Peer) -> Result<(), BtpError> {
        let socket = dial(&peer.url).await?;
        let (conn, outbound_rx) = PeerConnection::new(peer.id.clone(), self.high_water_mark);
        conn.set_state(PeerConnectionState::Connected).await;
        let (inbound_tx, mut inbound_rx) = mpsc::channel(self.high_water_mark);

        tokio::spawn(run_io_loop(socket, outbound_rx, inbound_tx));

        let auth_payload = AuthPayload {
            peer_id: peer.id.clone(),
            secret: peer.auth_token.clone(),
        };
        let auth_frame = BtpFrame::message(
            AUTH_REQUEST_ID,
            vec![ProtocolData::new("auth", 0, auth_payload.to_json_bytes())],
            None,
        );
        conn.send_reply(&auth_frame)?;

        let ack = tokio::time::timeout(AUTH_TIMEOUT, inbound_rx.recv())
            .await
            .map_err(|_| BtpError::AuthFailed("peer did not respond to auth within the deadline".to_string()))?
            .ok_or(BtpError::Disconnected)?;

        match ack.frame_type {
            FRAME_TYPE_RESPONSE => {}
            FRAME_TYPE_ERROR => return Err(BtpError::AuthFailed("peer rejected auth".to_string())),
            other => return Err(BtpError::AuthFailed(format!("unexpected frame type {other} during auth"))),
        }
        conn.set_state(PeerConnectionState::Authenticated).await;
        info!(peer = %peer.id, "outbound BTP peer authenticated");

        let conn = Arc::new(conn);
        self.registry.insert(conn.clone());
        let result = self.dispatch_loop(conn.clone(), inbound_rx).await;
        self.registry.remove(&peer.id);
        conn.set_state(PeerConnectionState::Disconnected).await;
        result
    }

    /// Accept an already-upgraded inbound socket, authenticate it against
    /// `known_secrets`, and run its dispatch loop until it closes.
    pub async fn accept_inbound(
        &self,
        socket: WebSocket,
        known_secrets: &HashMap<PeerId, String>,
    ) -> Result<(), BtpError> {
        let (outbound_tx, outbound_rx) = mpsc::channel(self.high_water_mark);
        let (inbound_tx, mut inbound_rx) = mpsc::channel(self.high_water_mark);
        let io_task = tokio::spawn(run_inbound_io_loop(socket, outbound_rx, inbound_tx));

        let first = inbound_rx.recv().await.ok_or(BtpError::Disconnected)?;
        if first.frame_type != FRAME_TYPE_MESSAGE {
            return Err(BtpError::AuthFailed("first frame was not a MESSAGE".to_string()));
        }
        let auth_data = first
            .find_protocol_data("auth")
            .ok_or_else(|| BtpError::AuthFailed("no auth protocol data in first frame".to_string()))?;
        let auth = AuthPayload::from_json_bytes(&auth_data.data)
            .map_err(|_| BtpError::AuthFailed("malformed auth payload".to_string()))?;

        let expected = known_secrets.get(&auth.peer_id);
        if expected != Some(&auth.secret) {
            let _ = outbound_tx.try_send(encode_frame(&BtpFrame::error(first.request_id, Vec::new())));
            return Err(BtpError::AuthFailed(format!("unknown peer or bad secret for {}", auth.peer_id)));
        }
        let _ = outbound_tx.try_send(encode_frame(&BtpFrame::response(first.request_id, Vec::new(), None)));

        let (conn, inner_outbound_rx) = PeerConnection::new(auth.peer_id.clone(), self.high_water_mark);
        // Re-home the already-spawned io loop's sender onto the connection by
        // forwarding everything the connection enqueues into the same channel
        // the io loop reads from.
        tokio::spawn(forward(inner_outbound_rx, outbound_tx));
        conn.set_state(PeerConnectionState::Authenticated).await;
        info!(peer = %auth.peer_id, "inbound BTP peer authenticated");

        let conn = Arc::new(conn);
        self.registry.insert(conn.clone());
        let result = self.dispatch_loop(conn.clone(), inbound_rx).await;
        self.registry.remove(&auth.peer_id);
        conn.set_state(PeerConnectionState::Disconnected).await;
        io_task.abort();
        result
    }

    async fn dispatch_loop(&self, conn: Arc<PeerConnection>, mut inbound_rx: mpsc::Receiver<BtpFrame>) -> Result<(), BtpError> {
        while let Some(frame) = inbound_rx.recv().await {
            match frame.frame_type {
                FRAME_TYPE_RESPONSE | FRAME_TYPE_ERROR => conn.resolve_response(frame),
                FRAME_TYPE_MESSAGE => self.handle_inbound_message(&conn, frame).await,
                other => warn!(peer = %conn.id, frame_type = other, "dropping frame of unknown type"),
            }
        }
        Ok(())
    }

    async fn handle_inbound_message(&self, conn: &Arc<PeerConnection>, frame: BtpFrame) {
        let Some(packet_bytes) = &frame.ilp_packet else {
            // A MESSAGE with no ILP packet (e.g. a heartbeat) gets an empty ack.
            let _ = conn.send_reply(&BtpFrame::response(frame.request_id, Vec::new(), None));
            return;
        };
        let prepare = match deserialize_packet(packet_bytes) {
            Ok(IlpPacket::Prepare(prepare)) => prepare,
            Ok(_) => {
                warn!(peer = %conn.id, "inbound MESSAGE carried a non-Prepare packet, ignoring");
                let _ = conn.send_reply(&BtpFrame::error(frame.request_id, Vec::new()));
                return;
            }
            Err(e) => {
                warn!(peer = %conn.id, error = %e, "dropping malformed inbound ILP packet");
                let _ = conn.send_reply(&BtpFrame::error(frame.request_id, Vec::new()));
                return;
            }
        };

        let outcome = self.handler.handle_prepare(prepare, conn.id.clone()).await;
        let response_packet = match outcome {
            IlpFulfillment::Fulfill(fulfill) => serialize(&IlpPacket::Fulfill(fulfill)),
            IlpFulfillment::Reject(reject) => serialize(&IlpPacket::Reject(reject)),
        };
        let _ = conn.send_reply(&BtpFrame::response(frame.request_id, Vec::new(), Some(response_packet.into())));
    }
}

/// Plumb a connection's own outbound queue into the channel its IO loop was
/// already spawned against, since [`PeerConnection::new`] always creates its
/// own channel pair.
async fn forward(mut from: mpsc::Receiver<Vec<u8>>, to: mpsc::Sender<Vec<u8>>) {
    while let Some(bytes) = from.recv().await {
        if to.send(bytes).await.is_err() {
            break;
        }
    }
}
