//! The optional messaging gateway: HTTP payment submission plus a
//! WebSocket edge for subscribed application clients, gated on
//! `ENABLE_PRIVATE_MESSAGING`.

pub mod http;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use ilp_events::{ClaimEventEnvelope, SubscriptionManager};
use ilp_packet_handler::HandlerContext;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Gateway-specific configuration, layered on top of [`ilp_packet_handler::HandlerContext`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub enabled: bool,
    pub http_port: u16,
    pub ws_port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            http_port: 3001,
            ws_port: 3002,
        }
    }
}

/// Shared state for pushing decoded event envelopes to subscribed clients.
/// The packet-handling plane publishes here whenever it decodes an envelope
/// worth relaying to local application clients.
#[derive(Clone)]
pub struct EventBus {
    pub subscriptions: Arc<SubscriptionManager>,
    sender: broadcast::Sender<ClaimEventEnvelope>,
}

impl EventBus {
    pub fn new(per_peer_subscription_cap: usize) -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self {
            subscriptions: Arc::new(SubscriptionManager::new(per_peer_subscription_cap)),
            sender,
        }
    }

    pub fn publish(&self, envelope: ClaimEventEnvelope) {
        // No active WS subscribers is the common case when the gateway first
        // starts; a `send` error here just means nobody is listening yet.
        let _ = self.sender.send(envelope);
    }

    fn ws_state(&self) -> ws::WsState {
        ws::WsState::new(self.subscriptions.clone(), self.sender.clone())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(ilp_events::DEFAULT_PER_PEER_CAP)
    }
}

/// Runs the HTTP and WebSocket edges until `shutdown` is cancelled. Both
/// servers share nothing but the [`HandlerContext`] and [`EventBus`] passed
/// in; each binds its own port.
pub async fn run(
    config: GatewayConfig,
    handler_ctx: Arc<HandlerContext>,
    events: EventBus,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let http_router = http::routes(handler_ctx);
    let ws_router = ws::routes(events.ws_state());

    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let ws_addr = SocketAddr::from(([0, 0, 0, 0], config.ws_port));

    let http_listener = tokio::net::TcpListener::bind(http_addr).await?;
    let ws_listener = tokio::net::TcpListener::bind(ws_addr).await?;

    tracing::info!(%http_addr, "messaging gateway HTTP endpoint listening");
    tracing::info!(%ws_addr, "messaging gateway websocket endpoint listening");

    let http_shutdown = shutdown.clone();
    let ws_shutdown = shutdown.clone();

    let http_server = axum::serve(http_listener, http_router)
        .with_graceful_shutdown(async move { http_shutdown.cancelled().await });
    let ws_server =
        axum::serve(ws_listener, ws_router).with_graceful_shutdown(async move { ws_shutdown.cancelled().await });

    tokio::try_join!(http_server, ws_server)?;
    Ok(())
}
