//! Per-peer connection state: request correlation, outbound queue, auth state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use ilp_types::{PeerConnectionState, PeerId};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::warn;

use crate::error::BtpError;
use crate::frame::{encode_frame, BtpFrame};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type PendingMap = DashMap<u32, oneshot::Sender<Result<BtpFrame, BtpError>>>;

/// One peer's connection: an outbound frame queue plus the request/response
/// correlation table.
///
/// The socket read/write loops live outside this struct (bound to whichever
/// transport — inbound axum upgrade or outbound `tokio-tungstenite` dial —
/// accepted the connection); this struct is the shared, transport-agnostic
/// state those loops and the packet handler both touch.
pub struct PeerConnection {
    pub id: PeerId,
    state: RwLock<PeerConnectionState>,
    outbound_tx: mpsc::Sender<Vec<u8>>,
    pending: PendingMap,
    next_request_id: AtomicU32,
    high_water_mark: usize,
}

impl PeerConnection {
    /// `high_water_mark` both bounds the outbound channel and is reported
    /// back in [`BtpError::QueueFull`] when send-without-blocking fails.
    pub fn new(id: PeerId, high_water_mark: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(high_water_mark);
        let conn = Self {
            id,
            state: RwLock::new(PeerConnectionState::Disconnected),
            outbound_tx: tx,
            pending: DashMap::new(),
            next_request_id: AtomicU32::new(1),
            high_water_mark,
        };
        (conn, rx)
    }

    pub async fn state(&self) -> PeerConnectionState {
        *self.state.read().await
    }

    pub async fn set_state(&self, state: PeerConnectionState) {
        *self.state.write().await = state;
    }

    fn enqueue_bytes(&self, bytes: Vec<u8>) -> Result<(), BtpError> {
        self.outbound_tx
            .try_send(bytes)
            .map_err(|_| BtpError::QueueFull(self.high_water_mark))
    }

    /// Send a `MESSAGE` frame and await its correlated response, failing
    /// with [`BtpError::Timeout`] after `deadline` and with
    /// [`BtpError::QueueFull`] immediately if the outbound queue is over its
    /// high-water mark.
    pub async fn send_request(
        &self,
        build: impl FnOnce(u32) -> BtpFrame,
        deadline: Duration,
    ) -> Result<BtpFrame, BtpError> {
        if self.state().await != PeerConnectionState::Authenticated {
            return Err(BtpError::Unauthenticated);
        }
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let frame = build(request_id);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(request_id, tx);

        if let Err(e) = self.enqueue_bytes(encode_frame(&frame)) {
            self.pending.remove(&request_id);
            return Err(e);
        }

        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                self.pending.remove(&request_id);
                Err(BtpError::Disconnected)
            }
            Err(_) => {
                self.pending.remove(&request_id);
                Err(BtpError::Timeout(request_id))
            }
        }
    }

    /// Send a frame that is not awaiting a correlated response (a `RESPONSE`
    /// or `ERROR` frame answering a peer-initiated `MESSAGE`).
    pub fn send_reply(&self, frame: &BtpFrame) -> Result<(), BtpError> {
        self.enqueue_bytes(encode_frame(frame))
    }

    /// Resolve a `RESPONSE`/`ERROR` frame against its pending request.
    ///
    /// A `request_id` with no pending entry is dropped with a warning — it's
    /// either stale (already timed out and removed) or a duplicate the peer
    /// sent twice.
    pub fn resolve_response(&self, frame: BtpFrame) {
        match self.pending.remove(&frame.request_id) {
            Some((_, resolver)) => {
                let _ = resolver.send(Ok(frame));
            }
            None => {
                warn!(
                    peer = %self.id,
                    request_id = frame.request_id,
                    "dropping BTP response/error with no matching pending request"
                );
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

pub fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::BtpFrame;

    #[tokio::test]
    async fn request_fails_fast_when_not_authenticated() {
        let (conn, _rx) = PeerConnection::new("peer1".to_string(), 8);
        let result = conn
            .send_request(|id| BtpFrame::message(id, Vec::new(), None), Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(BtpError::Unauthenticated)));
    }

    #[tokio::test]
    async fn request_resolves_on_matching_response() {
        let (conn, mut rx) = PeerConnection::new("peer1".to_string(), 8);
        conn.set_state(PeerConnectionState::Authenticated).await;

        let send_fut = conn.send_request(|id| BtpFrame::message(id, Vec::new(), None), Duration::from_secs(5));
        tokio::pin!(send_fut);

        // Drain the encoded request so the queue doesn't look stuck, then
        // resolve it as if the response arrived on the read loop.
        let sent_bytes = rx.recv().await.unwrap();
        let sent_frame = crate::frame::decode_frame(&sent_bytes).unwrap();
        conn.resolve_response(BtpFrame::response(sent_frame.request_id, Vec::new(), None));

        let result = send_fut.await.unwrap();
        assert_eq!(result.frame_type, crate::frame::FRAME_TYPE_RESPONSE);
    }

    #[tokio::test]
    async fn request_times_out_without_response() {
        let (conn, mut _rx) = PeerConnection::new("peer1".to_string(), 8);
        conn.set_state(PeerConnectionState::Authenticated).await;
        let result = conn
            .send_request(
                |id| BtpFrame::message(id, Vec::new(), None),
                Duration::from_millis(20),
            )
            .await;
        assert!(matches!(result, Err(BtpError::Timeout(_))));
        assert_eq!(conn.pending_count(), 0);
    }

    #[tokio::test]
    async fn queue_full_fails_fast() {
        let (conn, _rx) = PeerConnection::new("peer1".to_string(), 1);
        conn.set_state(PeerConnectionState::Authenticated).await;
        conn.enqueue_bytes(vec![0]).unwrap();
        let result = conn
            .send_request(|id| BtpFrame::message(id, Vec::new(), None), Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(BtpError::QueueFull(1))));
    }

    #[test]
    fn unmatched_response_is_dropped_without_panicking() {
        let (conn, _rx) = PeerConnection::new("peer1".to_string(), 8);
        conn.resolve_response(BtpFrame::response(999, Vec::new(), None));
    }
}
