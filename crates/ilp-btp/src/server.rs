//! Inbound BTP: an axum WebSocket upgrade endpoint.
//!
//! The server side shares the same frame codec and `PeerConnection` state as
//! the outbound client in [`crate::transport`]; only the socket type differs.

use axum::extract::ws::{Message as AxumMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::frame::{decode_frame, BtpFrame};

/// Drive one inbound, already-upgraded WebSocket until it closes or errors.
///
/// Mirrors [`crate::transport::run_io_loop`] but for axum's socket type,
/// which callers get from `WebSocketUpgrade::on_upgrade`.
pub async fn run_inbound_io_loop(
    mut socket: WebSocket,
    mut outbound_rx: mpsc::Receiver<Vec<u8>>,
    inbound_tx: mpsc::Sender<BtpFrame>,
) {
    loop {
        tokio::select! {
            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(bytes) => {
                        if let Err(e) = socket.send(AxumMessage::Binary(bytes.into())).await {
                            warn!(error = %e, "inbound BTP socket write failed, closing connection");
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(AxumMessage::Binary(bytes))) => {
                        match decode_frame(&bytes) {
                            Ok(frame) => {
                                if inbound_tx.send(frame).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => debug!(error = %e, "dropping malformed BTP frame"),
                        }
                    }
                    Some(Ok(AxumMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "inbound BTP socket read failed, closing connection");
                        break;
                    }
                }
            }
        }
    }
}
