//! The admin surface: typed peer/route/settlement operations over HTTP.
//!
//! A generic-state `axum::Router` plus an `IntoResponse` impl classifying
//! domain errors into HTTP statuses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use dashmap::DashMap;
use ilp_btp::PeerManager;
use ilp_claims::{Chain, ClaimManager, SettlementOutcome};
use ilp_packet_handler::{handle_prepare, HandlerContext};
use ilp_routing::RoutingTable;
use ilp_types::{IlpAddress, IlpFulfillment, Peer, PeerConnectionState, PeerId, Prepare};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The peer id attributed to Prepares the admin surface originates directly.
pub const ADMIN_SOURCE_PEER_ID: &str = "admin-local";

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    error: String,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            AdminError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad-request"),
            AdminError::NotFound(_) => (StatusCode::NOT_FOUND, "not-found"),
            AdminError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AdminError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "service-unavailable"),
            AdminError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            AdminError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        (status, Json(ErrorBody { kind, error: self.to_string() })).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPeerRequest {
    pub id: String,
    pub url: String,
    pub auth_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRouteRequest {
    pub prefix: String,
    pub next_hop: String,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerStatusResponse {
    pub peer_id: PeerId,
    pub state: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPrepareRequest {
    pub destination: String,
    pub amount: u64,
    pub execution_condition_hex: String,
    #[serde(default)]
    pub data_hex: String,
    #[serde(default)]
    pub expires_in_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmitPrepareResponse {
    #[serde(rename_all = "camelCase")]
    Fulfilled { fulfillment_hex: String, data_hex: String },
    #[serde(rename_all = "camelCase")]
    Rejected {
        code: String,
        triggered_by: String,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub chain: Chain,
    pub channel_id: String,
    pub amount: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SettleResponse {
    Success { tx_hash: String },
    Failed { error: String },
}

/// The typed admin operations named by the connector's management surface.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn add_peer(&self, request: AddPeerRequest) -> Result<(), AdminError>;
    async fn remove_peer(&self, peer_id: &str) -> Result<(), AdminError>;
    async fn add_route(&self, request: AddRouteRequest) -> Result<(), AdminError>;
    async fn remove_route(&self, prefix: &str) -> Result<(), AdminError>;
    async fn peer_status(&self, peer_id: &str) -> Result<PeerStatusResponse, AdminError>;
    async fn submit_prepare(&self, request: SubmitPrepareRequest) -> Result<SubmitPrepareResponse, AdminError>;
    async fn initiate_settlement(&self, peer_id: &str, request: SettleRequest) -> Result<SettleResponse, AdminError>;
}

/// The live admin surface: owns the routing table, the peering fabric, and
/// the claim manager, plus the per-peer cancellation tokens that let
/// `remove_peer` actually tear down a running dial loop.
pub struct AdminState {
    routing: Arc<RoutingTable>,
    peer_manager: Arc<PeerManager>,
    handler_ctx: Arc<HandlerContext>,
    claims: Arc<ClaimManager>,
    dial_tasks: DashMap<PeerId, CancellationToken>,
    shutdown: CancellationToken,
}

impl AdminState {
    pub fn new(
        routing: Arc<RoutingTable>,
        peer_manager: Arc<PeerManager>,
        handler_ctx: Arc<HandlerContext>,
        claims: Arc<ClaimManager>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            routing,
            peer_manager,
            handler_ctx,
            claims,
            dial_tasks: DashMap::new(),
            shutdown,
        }
    }
}

#[async_trait]
impl AdminApi for AdminState {
    async fn add_peer(&self, request: AddPeerRequest) -> Result<(), AdminError> {
        if request.id.is_empty() || request.url.is_empty() {
            return Err(AdminError::BadRequest("peer id and url are required".to_string()));
        }
        if self.dial_tasks.contains_key(&request.id) {
            return Err(AdminError::Conflict(format!("peer {} is already configured", request.id)));
        }
        let peer = Peer::new(request.id.clone(), request.url, request.auth_token);
        let peer_token = self.shutdown.child_token();
        self.dial_tasks.insert(request.id.clone(), peer_token.clone());

        let manager = self.peer_manager.clone();
        tokio::spawn(async move {
            manager.run_outbound(peer, peer_token).await;
        });
        info!(peer_id = %request.id, "admin surface added peer");
        Ok(())
    }

    async fn remove_peer(&self, peer_id: &str) -> Result<(), AdminError> {
        match self.dial_tasks.remove(peer_id) {
            Some((_, token)) => {
                token.cancel();
                info!(%peer_id, "admin surface removed peer");
                Ok(())
            }
            None => Err(AdminError::NotFound(format!("peer {peer_id} is not configured"))),
        }
    }

    async fn add_route(&self, request: AddRouteRequest) -> Result<(), AdminError> {
        let prefix = IlpAddress::parse(&request.prefix)
            .map_err(|e| AdminError::BadRequest(format!("invalid prefix: {e}")))?;
        self.routing.add(&prefix, request.next_hop, request.priority);
        Ok(())
    }

    async fn remove_route(&self, prefix: &str) -> Result<(), AdminError> {
        let prefix = IlpAddress::parse(prefix).map_err(|e| AdminError::BadRequest(format!("invalid prefix: {e}")))?;
        if self.routing.remove(&prefix) {
            Ok(())
        } else {
            Err(AdminError::NotFound(format!("no route configured for {}", prefix.as_str())))
        }
    }

    async fn peer_status(&self, peer_id: &str) -> Result<PeerStatusResponse, AdminError> {
        let conn = self
            .handler_ctx
            .peers
            .get(peer_id)
            .ok_or_else(|| AdminError::NotFound(format!("peer {peer_id} is not connected")))?;
        let state = match conn.state().await {
            PeerConnectionState::Disconnected => "disconnected",
            PeerConnectionState::Dialing => "dialing",
            PeerConnectionState::Connected => "connected",
            PeerConnectionState::Authenticated => "authenticated",
        };
        Ok(PeerStatusResponse {
            peer_id: peer_id.to_string(),
            state,
        })
    }

    async fn submit_prepare(&self, request: SubmitPrepareRequest) -> Result<SubmitPrepareResponse, AdminError> {
        let destination = IlpAddress::parse(&request.destination)
            .map_err(|e| AdminError::BadRequest(format!("invalid destination: {e}")))?;
        let condition_bytes = hex::decode(&request.execution_condition_hex)
            .map_err(|e| AdminError::BadRequest(format!("invalid hex executionConditionHex: {e}")))?;
        if condition_bytes.len() != 32 {
            return Err(AdminError::BadRequest("executionConditionHex must decode to exactly 32 bytes".to_string()));
        }
        let mut execution_condition = [0u8; 32];
        execution_condition.copy_from_slice(&condition_bytes);

        let data = if request.data_hex.is_empty() {
            Vec::new()
        } else {
            hex::decode(&request.data_hex).map_err(|e| AdminError::BadRequest(format!("invalid hex dataHex: {e}")))?
        };

        let expires_at = Utc::now() + Duration::from_millis(request.expires_in_ms.unwrap_or(30_000).max(0) as u64);
        let prepare = Prepare {
            amount: request.amount,
            expires_at,
            execution_condition,
            destination,
            data: data.into(),
        };

        let outcome = handle_prepare(prepare, ADMIN_SOURCE_PEER_ID.to_string(), &self.handler_ctx).await;
        Ok(match outcome {
            IlpFulfillment::Fulfill(fulfill) => SubmitPrepareResponse::Fulfilled {
                fulfillment_hex: hex::encode(fulfill.fulfillment),
                data_hex: hex::encode(&fulfill.data),
            },
            IlpFulfillment::Reject(reject) => SubmitPrepareResponse::Rejected {
                code: reject.code,
                triggered_by: reject.triggered_by,
                message: reject.message,
            },
        })
    }

    async fn initiate_settlement(&self, peer_id: &str, request: SettleRequest) -> Result<SettleResponse, AdminError> {
        let outcome = self
            .claims
            .settle(peer_id, request.chain, &request.channel_id, request.amount)
            .await;
        Ok(match outcome {
            SettlementOutcome::Success { tx_hash } => SettleResponse::Success { tx_hash },
            SettlementOutcome::Failed { error } => SettleResponse::Failed { error },
        })
    }
}

pub fn routes(state: Arc<dyn AdminApi>) -> Router {
    Router::new()
        .route("/admin/peers", post(add_peer))
        .route("/admin/peers/{peer_id}", delete(remove_peer))
        .route("/admin/peers/{peer_id}", get(peer_status))
        .route("/admin/routes", post(add_route))
        .route("/admin/routes/{prefix}", delete(remove_route))
        .route("/admin/prepare", post(submit_prepare))
        .route("/admin/peers/{peer_id}/settle", post(initiate_settlement))
        .with_state(state)
}

async fn add_peer(State(state): State<Arc<dyn AdminApi>>, Json(body): Json<AddPeerRequest>) -> Response {
    match state.add_peer(body).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn remove_peer(State(state): State<Arc<dyn AdminApi>>, Path(peer_id): Path<String>) -> Response {
    match state.remove_peer(&peer_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn peer_status(State(state): State<Arc<dyn AdminApi>>, Path(peer_id): Path<String>) -> Response {
    match state.peer_status(&peer_id).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn add_route(State(state): State<Arc<dyn AdminApi>>, Json(body): Json<AddRouteRequest>) -> Response {
    match state.add_route(body).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn remove_route(State(state): State<Arc<dyn AdminApi>>, Path(prefix): Path<String>) -> Response {
    match state.remove_route(&prefix).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn submit_prepare(State(state): State<Arc<dyn AdminApi>>, Json(body): Json<SubmitPrepareRequest>) -> Response {
    match state.submit_prepare(body).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn initiate_settlement(
    State(state): State<Arc<dyn AdminApi>>,
    Path(peer_id): Path<String>,
    Json(body): Json<SettleRequest>,
) -> Response {
    match state.initiate_settlement(&peer_id, body).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilp_claims::MemoryClaimStore;
    use ilp_packet_handler::{LocalSink, LOCAL_SINK_PEER_ID};
    use std::collections::HashMap as StdHashMap;

    struct UnreachableSink;
    #[async_trait]
    impl LocalSink for UnreachableSink {
        async fn deliver(&self, _prepare: &Prepare, _source_peer: &PeerId) -> IlpFulfillment {
            panic!("not exercised in these tests")
        }
    }

    fn state() -> AdminState {
        let routing = Arc::new(RoutingTable::new());
        let peers = Arc::new(ilp_btp::PeerRegistry::new());
        let handler_ctx = Arc::new(HandlerContext {
            routing: routing.clone(),
            peers: peers.clone(),
            fee: Default::default(),
            local_sink: Arc::new(UnreachableSink),
            self_address: IlpAddress::parse("g.hub").unwrap(),
        });
        let claims = Arc::new(ClaimManager::new(
            StdHashMap::new(),
            StdHashMap::new(),
            Arc::new(MemoryClaimStore::new()),
        ));
        let peer_manager = Arc::new(PeerManager::new(peers, Arc::new(NoopHandler), 16));
        AdminState::new(routing, peer_manager, handler_ctx, claims, CancellationToken::new())
    }

    struct NoopHandler;
    #[async_trait]
    impl ilp_btp::InboundPrepareHandler for NoopHandler {
        async fn handle_prepare(&self, _prepare: Prepare, _source_peer: PeerId) -> IlpFulfillment {
            unreachable!("not exercised in these tests")
        }
    }

    #[tokio::test]
    async fn add_route_then_remove_round_trips() {
        let state = state();
        state
            .add_route(AddRouteRequest {
                prefix: "g.hub.alice".to_string(),
                next_hop: LOCAL_SINK_PEER_ID.to_string(),
                priority: 0,
            })
            .await
            .unwrap();
        state.remove_route("g.hub.alice").await.unwrap();
        assert!(matches!(state.remove_route("g.hub.alice").await, Err(AdminError::NotFound(_))));
    }

    #[tokio::test]
    async fn peer_status_for_unknown_peer_is_not_found() {
        let state = state();
        assert!(matches!(state.peer_status("ghost").await, Err(AdminError::NotFound(_))));
    }

    #[tokio::test]
    async fn add_peer_twice_conflicts() {
        let state = state();
        state
            .add_peer(AddPeerRequest {
                id: "peer1".to_string(),
                url: "ws://localhost:4000".to_string(),
                auth_token: "secret".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(
            state
                .add_peer(AddPeerRequest {
                    id: "peer1".to_string(),
                    url: "ws://localhost:4000".to_string(),
                    auth_token: "secret".to_string(),
                })
                .await,
            Err(AdminError::Conflict(_))
        ));
        state.remove_peer("peer1").await.unwrap();
    }

    #[tokio::test]
    async fn settling_with_no_stored_claim_reports_failure_not_an_error() {
        let state = state();
        let response = state
            .initiate_settlement(
                "peer1",
                SettleRequest {
                    chain: Chain::Evm,
                    channel_id: "chan-1".to_string(),
                    amount: 1000,
                },
            )
            .await
            .unwrap();
        assert!(matches!(response, SettleResponse::Failed { .. }));
    }
}
