//! `POST /pay`: accept an application payload plus destination/amount,
//! submit it into the packet handler as a locally originated payment.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use chrono::Utc;
use ilp_packet_handler::{handle_prepare, HandlerContext};
use ilp_types::{IlpAddress, IlpFulfillment, Prepare};
use serde::{Deserialize, Serialize};

/// The peer id attributed to payments originated locally through the gateway.
/// Never equal to a real BTP peer id, so the handler's loop guard never fires
/// on it.
pub const GATEWAY_SOURCE_PEER_ID: &str = "gateway-local";

const DEFAULT_EXPIRY_MS: i64 = 30_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub destination: String,
    pub amount: u64,
    /// Base64-encoded 32-byte SHA-256 execution condition.
    pub execution_condition: String,
    /// Base64-encoded opaque application payload.
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub expires_in_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PayResponse {
    #[serde(rename_all = "camelCase")]
    Fulfilled { fulfillment: String, data: String },
    #[serde(rename_all = "camelCase")]
    Rejected {
        code: String,
        triggered_by: String,
        message: String,
    },
}

#[derive(Debug, Serialize)]
struct PayError {
    error: String,
}

pub fn routes(ctx: Arc<HandlerContext>) -> Router {
    Router::new().route("/pay", post(post_pay)).with_state(ctx)
}

async fn post_pay(State(ctx): State<Arc<HandlerContext>>, Json(body): Json<PayRequest>) -> impl IntoResponse {
    let destination = match IlpAddress::parse(body.destination.clone()) {
        Ok(addr) => addr,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PayError {
                    error: format!("invalid destination address: {e}"),
                }),
            )
                .into_response()
        }
    };

    let condition_bytes = match b64.decode(&body.execution_condition) {
        Ok(bytes) if bytes.len() == 32 => bytes,
        Ok(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PayError {
                    error: "executionCondition must decode to exactly 32 bytes".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PayError {
                    error: format!("invalid base64 executionCondition: {e}"),
                }),
            )
                .into_response()
        }
    };
    let mut execution_condition = [0u8; 32];
    execution_condition.copy_from_slice(&condition_bytes);

    let data = if body.data.is_empty() {
        Vec::new()
    } else {
        match b64.decode(&body.data) {
            Ok(bytes) => bytes,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(PayError {
                        error: format!("invalid base64 data: {e}"),
                    }),
                )
                    .into_response()
            }
        }
    };

    let expires_at = Utc::now() + Duration::from_millis(body.expires_in_ms.unwrap_or(DEFAULT_EXPIRY_MS).max(0) as u64);

    let prepare = Prepare {
        amount: body.amount,
        expires_at,
        execution_condition,
        destination,
        data: data.into(),
    };

    let outcome = handle_prepare(prepare, GATEWAY_SOURCE_PEER_ID.to_string(), &ctx).await;

    match outcome {
        IlpFulfillment::Fulfill(fulfill) => (
            StatusCode::OK,
            Json(PayResponse::Fulfilled {
                fulfillment: b64.encode(fulfill.fulfillment),
                data: b64.encode(&fulfill.data),
            }),
        )
            .into_response(),
        IlpFulfillment::Reject(reject) => (
            StatusCode::OK,
            Json(PayResponse::Rejected {
                code: reject.code,
                triggered_by: reject.triggered_by,
                message: reject.message,
            }),
        )
            .into_response(),
    }
}
