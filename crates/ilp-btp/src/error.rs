//! BTP-layer error taxonomy: transport and request-correlation failures.

use ilp_types::CodecError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BtpError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("request {0} timed out waiting for a response")]
    Timeout(u32),
    #[error("peer is not authenticated")]
    Unauthenticated,
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("send queue is full (high-water mark {0} exceeded)")]
    QueueFull(usize),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("duplicate request id {0} from peer, frame dropped")]
    DuplicateRequestId(u32),
    #[error("peer disconnected")]
    Disconnected,
}
