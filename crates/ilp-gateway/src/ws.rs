//! Messaging WebSocket: local application clients register Nostr-style
//! filters and receive matching decoded event envelopes as they arrive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use ilp_events::{ClaimEventEnvelope, Filter, SubscriptionManager};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Clone)]
pub struct WsState {
    pub subscriptions: Arc<SubscriptionManager>,
    pub events: broadcast::Sender<ClaimEventEnvelope>,
}

impl WsState {
    pub fn new(subscriptions: Arc<SubscriptionManager>, events: broadcast::Sender<ClaimEventEnvelope>) -> Self {
        Self { subscriptions, events }
    }
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientCommand {
    Subscribe { sub_id: String, filter: Filter },
    Unsubscribe { sub_id: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ServerMessage<'a> {
    Event {
        sub_id: String,
        envelope: &'a ClaimEventEnvelope,
    },
    Error {
        message: String,
    },
}

pub fn routes(state: WsState) -> Router {
    Router::new().route("/messaging", get(upgrade)).with_state(state)
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<WsState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WsState) {
    let peer_id = format!("gateway-ws-{}", NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    let (mut sink, mut stream) = socket.split();
    let mut events = state.events.subscribe();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_command(&text, &peer_id, &state, &mut sink).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, %peer_id, "messaging websocket read failed");
                        break;
                    }
                }
            }
            broadcasted = events.recv() => {
                match broadcasted {
                    Ok(envelope) => {
                        for sub_id in state.subscriptions.matching_for_peer(&peer_id, &envelope.content) {
                            let message = ServerMessage::Event { sub_id, envelope: &envelope };
                            if send_json(&mut sink, &message).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, %peer_id, "messaging websocket client lagged behind the event stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    state.subscriptions.unregister_all_for_peer(&peer_id);
}

async fn handle_command(
    text: &str,
    peer_id: &str,
    state: &WsState,
    sink: &mut futures_util::stream::SplitSink<WebSocket, Message>,
) {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            let _ = send_json(sink, &ServerMessage::Error { message: e.to_string() }).await;
            return;
        }
    };
    match command {
        ClientCommand::Subscribe { sub_id, filter } => {
            if let Err(e) = state.subscriptions.register(peer_id.to_string(), sub_id, filter) {
                let _ = send_json(sink, &ServerMessage::Error { message: e.to_string() }).await;
            }
        }
        ClientCommand::Unsubscribe { sub_id } => {
            state.subscriptions.unregister(peer_id, &sub_id);
        }
    }
}

async fn send_json(
    sink: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    message: &ServerMessage<'_>,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).unwrap_or_else(|_| "{\"type\":\"error\"}".to_string());
    sink.send(Message::Text(text.into())).await
}
