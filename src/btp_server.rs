//! Inbound BTP: upgrades the root path to a WebSocket and hands it to the
//! peering fabric for auth and steady-state dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use ilp_btp::PeerManager;
use ilp_types::PeerId;
use tracing::warn;

#[derive(Clone)]
struct BtpServerState {
    peer_manager: Arc<PeerManager>,
    known_secrets: Arc<HashMap<PeerId, String>>,
}

pub fn routes(peer_manager: Arc<PeerManager>, known_secrets: Arc<HashMap<PeerId, String>>) -> Router {
    let state = BtpServerState {
        peer_manager,
        known_secrets,
    };
    Router::new().route("/", get(upgrade)).with_state(state)
}

async fn upgrade(State(state): State<BtpServerState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = state.peer_manager.accept_inbound(socket, &state.known_secrets).await {
            warn!(error = %e, "inbound BTP connection ended");
        }
    })
}
