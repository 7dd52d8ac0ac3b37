//! ILP connector entrypoint: load config, stand up the packet-handling and
//! peering fabric, the admin surface, and the optional messaging gateway.

mod admin;
mod btp_server;
mod config;
mod local_sink;
mod sig_down;
mod telemetry;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use ilp_btp::{InboundPrepareHandler, PeerManager, PeerRegistry};
use ilp_claims::{ClaimManager, MemoryClaimStore};
use ilp_gateway::{EventBus, GatewayConfig};
use ilp_packet_handler::HandlerContext;
use ilp_routing::RoutingTable;
use ilp_types::{IlpAddress, IlpFulfillment, PeerId, Prepare};
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::admin::{AddPeerRequest, AdminApi, AdminState};
use crate::config::NodeConfig;
use crate::local_sink::NoLocalReceiver;
use crate::sig_down::SigDown;
use crate::telemetry::Telemetry;

/// Outbound-queue depth for every peer connection, inbound and outbound.
const PEER_HIGH_WATER_MARK: usize = 1024;

/// Bridges the BTP fabric's narrow [`InboundPrepareHandler`] trait to the
/// packet handler, keeping `ilp-btp` free of a dependency on
/// `ilp-packet-handler` (which already depends on `ilp-btp`).
struct PacketHandlerBridge {
    ctx: Arc<HandlerContext>,
}

#[async_trait]
impl InboundPrepareHandler for PacketHandlerBridge {
    async fn handle_prepare(&self, prepare: Prepare, source_peer: PeerId) -> IlpFulfillment {
        ilp_packet_handler::handle_prepare(prepare, source_peer, &self.ctx).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _telemetry = Telemetry::init();

    let config = NodeConfig::load()?;
    let self_address = IlpAddress::parse(&config.self_address)
        .unwrap_or_else(|e| panic!("selfAddress {:?} is not a valid ILP address: {e}", config.self_address));

    let routing = Arc::new(RoutingTable::new());
    for route in &config.routes {
        let prefix = IlpAddress::parse(&route.prefix)
            .unwrap_or_else(|e| panic!("route prefix {:?} is not a valid ILP address: {e}", route.prefix));
        routing.add(&prefix, route.next_hop.clone(), route.priority);
    }

    let peers = Arc::new(PeerRegistry::new());
    let handler_ctx = Arc::new(HandlerContext {
        routing: routing.clone(),
        peers: peers.clone(),
        fee: config.fee,
        local_sink: Arc::new(NoLocalReceiver {
            self_address: self_address.as_str().to_string(),
        }),
        self_address,
    });

    let claims = Arc::new(ClaimManager::new(HashMap::new(), HashMap::new(), Arc::new(MemoryClaimStore::new())));

    let bridge = Arc::new(PacketHandlerBridge { ctx: handler_ctx.clone() });
    let peer_manager = Arc::new(PeerManager::new(peers.clone(), bridge, PEER_HIGH_WATER_MARK));

    let sig_down = SigDown::try_new()?;
    let shutdown = sig_down.cancellation_token();

    let admin_state: Arc<dyn AdminApi> = Arc::new(AdminState::new(
        routing.clone(),
        peer_manager.clone(),
        handler_ctx.clone(),
        claims.clone(),
        shutdown.clone(),
    ));

    let mut known_secrets: HashMap<PeerId, String> = HashMap::new();
    for peer in &config.peers {
        known_secrets.insert(peer.id.clone(), peer.auth_token.clone().unwrap_or_default());
    }
    let known_secrets = Arc::new(known_secrets);

    for peer in &config.peers {
        admin_state
            .add_peer(AddPeerRequest {
                id: peer.id.clone(),
                url: peer.url.clone(),
                auth_token: peer.auth_token.clone().unwrap_or_default(),
            })
            .await
            .unwrap_or_else(|e| tracing::error!(peer_id = %peer.id, error = %e, "failed to dial configured peer"));
    }

    let router = Router::new()
        .merge(btp_server::routes(peer_manager.clone(), known_secrets))
        .merge(admin::routes(admin_state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.btp_server_port));
    tracing::info!(%addr, "BTP/admin server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server_shutdown = shutdown.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move { server_shutdown.cancelled().await });

    if config.enable_private_messaging {
        let gateway_config = GatewayConfig {
            enabled: true,
            http_port: config.messaging_gateway_port,
            ws_port: config.messaging_websocket_port,
        };
        let events = EventBus::new(ilp_events::DEFAULT_PER_PEER_CAP);
        let gateway_shutdown = shutdown.clone();
        let gateway_ctx = handler_ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = ilp_gateway::run(gateway_config, gateway_ctx, events, gateway_shutdown).await {
                tracing::error!(error = %e, "messaging gateway exited with an error");
            }
        });
    }

    server.await?;
    Ok(())
}
