//! Binds the transport-agnostic [`crate::connection::PeerConnection`] state to
//! an actual outbound WebSocket dial.
//!
//! Inbound connections are driven by [`crate::server`] instead, since they
//! arrive through an axum upgrade rather than a direct dial.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::BtpError;
use crate::frame::{decode_frame, BtpFrame};

pub type OutboundSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dial `url`, returning the connected socket ready to be driven by
/// [`run_io_loop`].
pub async fn dial(url: &str) -> Result<OutboundSocket, BtpError> {
    let (socket, _response) = connect_async(url)
        .await
        .map_err(|e| BtpError::Transport(e.to_string()))?;
    Ok(socket)
}

/// Drive one connection's socket until it closes or errors: forward frames
/// queued on `outbound_rx` to the wire, and push every decoded inbound frame
/// to `inbound_tx`. The caller owns reconnect policy; this loop just reports
/// that the connection ended.
pub async fn run_io_loop<S>(
    mut socket: WebSocketStream<S>,
    mut outbound_rx: mpsc::Receiver<Vec<u8>>,
    inbound_tx: mpsc::Sender<BtpFrame>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    loop {
        tokio::select! {
            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(bytes) => {
                        if let Err(e) = socket.send(WsMessage::Binary(bytes.into())).await {
                            warn!(error = %e, "BTP socket write failed, closing connection");
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(WsMessage::Binary(bytes))) => {
                        match decode_frame(&bytes) {
                            Ok(frame) => {
                                if inbound_tx.send(frame).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => debug!(error = %e, "dropping malformed BTP frame"),
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "BTP socket read failed, closing connection");
                        break;
                    }
                }
            }
        }
    }
}
