//! The ten-step inbound-Prepare procedure: validate, look up the route,
//! apply fees and hold time, forward or deliver locally, and propagate the
//! resulting Fulfill or Reject back to the sender.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ilp_btp::{BtpError, BtpFrame, PeerRegistry};
use ilp_codec::packet::{deserialize_packet, serialize};
use ilp_routing::RoutingTable;
use ilp_types::{IlpAddress, IlpFulfillment, IlpPacket, PeerId, Prepare, Reject};
use tracing::{error, warn};

use crate::config::FeeConfig;

/// The peer id reserved for routes that terminate at this node rather than
/// forwarding onward.
pub const LOCAL_SINK_PEER_ID: &str = "self";

/// The application-level sink invoked when a route names [`LOCAL_SINK_PEER_ID`].
#[async_trait]
pub trait LocalSink: Send + Sync {
    async fn deliver(&self, prepare: &Prepare, source_peer: &PeerId) -> IlpFulfillment;
}

/// Everything the packet handler needs beyond the inbound Prepare itself.
pub struct HandlerContext {
    pub routing: Arc<RoutingTable>,
    pub peers: Arc<PeerRegistry>,
    pub fee: FeeConfig,
    pub local_sink: Arc<dyn LocalSink>,
    pub self_address: IlpAddress,
}

fn reject(code: &str, triggered_by: &IlpAddress, message: impl Into<String>) -> IlpFulfillment {
    IlpFulfillment::Reject(Reject::new(code, triggered_by.as_str(), message, Vec::new()))
}

/// Process one inbound Prepare and return its outcome. Never panics on
/// malformed or adversarial input; every failure path maps to a Reject in
/// the closed error taxonomy.
pub async fn handle_prepare(
    prepare: Prepare,
    source_peer: PeerId,
    ctx: &HandlerContext,
) -> IlpFulfillment {
    let now = Utc::now();

    // Step 1: expiry check.
    if prepare.is_expired_at(now) {
        return reject("R00", &ctx.self_address, "transfer timed out");
    }

    // Step 2: address validation is enforced by `IlpAddress`'s constructor —
    // a `Prepare` can't carry a syntactically invalid destination by the
    // time it reaches this function, so there is nothing left to check here.

    // Step 3: route lookup.
    let Some(next_hop) = ctx.routing.lookup(&prepare.destination) else {
        return reject("F02", &ctx.self_address, "no route to destination");
    };

    // Step 4: loop guard.
    if next_hop == source_peer {
        return reject("F02", &ctx.self_address, "next hop is the source peer");
    }

    // Step 5: local delivery short-circuits the rest of the procedure.
    if next_hop == LOCAL_SINK_PEER_ID {
        return ctx.local_sink.deliver(&prepare, &source_peer).await;
    }

    // Step 6: fee application.
    let forwarded_amount = ctx.fee.forwarded_amount(prepare.amount);
    if forwarded_amount < ctx.fee.min_forwarded_amount {
        return reject(
            "T04",
            &ctx.self_address,
            "forwarded amount below configured minimum after fee",
        );
    }

    // Step 7: expiry shrink.
    let max_hold = chrono::Duration::milliseconds(ctx.fee.max_hold_time_ms);
    let min_hold = chrono::Duration::milliseconds(ctx.fee.min_hold_time_ms);
    let forwarded_expiry = prepare.expires_at.min(now + max_hold);
    if forwarded_expiry <= now + min_hold {
        return reject("R00", &ctx.self_address, "insufficient hold time remaining after shrink");
    }

    // Step 8: build the forwarded Prepare.
    let forwarded = Prepare {
        amount: forwarded_amount,
        expires_at: forwarded_expiry,
        execution_condition: prepare.execution_condition,
        destination: prepare.destination.clone(),
        data: prepare.data.clone(),
    };

    let Some(peer) = ctx.peers.get(&next_hop) else {
        return reject("T01", &ctx.self_address, "next hop peer is not connected");
    };

    let deadline = (forwarded_expiry - now)
        .to_std()
        .unwrap_or(Duration::from_millis(0));

    // Step 9: await the correlated response.
    let response = peer
        .send_request(
            move |request_id| BtpFrame::message(request_id, Vec::new(), Some(serialize(&IlpPacket::Prepare(forwarded)).into())),
            deadline,
        )
        .await;

    match response {
        Ok(frame) => match frame.ilp_packet {
            Some(bytes) => match deserialize_packet(&bytes) {
                Ok(IlpPacket::Fulfill(fulfill)) => {
                    if fulfill.satisfies(&prepare.execution_condition) {
                        IlpFulfillment::Fulfill(fulfill)
                    } else {
                        error!(peer = %next_hop, "upstream returned a fulfillment that does not satisfy the execution condition");
                        reject("F05", &ctx.self_address, "wrong condition")
                    }
                }
                Ok(IlpPacket::Reject(upstream_reject)) => IlpFulfillment::Reject(upstream_reject),
                Ok(IlpPacket::Prepare(_)) => {
                    warn!(peer = %next_hop, "upstream response carried a Prepare, not Fulfill/Reject");
                    reject("T00", &ctx.self_address, "malformed upstream response")
                }
                Err(e) => {
                    warn!(peer = %next_hop, error = %e, "upstream response failed to decode");
                    reject("T00", &ctx.self_address, "malformed upstream response")
                }
            },
            None => reject("T00", &ctx.self_address, "upstream response carried no packet"),
        },
        // Step 10: timeout / transport error.
        Err(BtpError::Timeout(_)) => reject("R00", &ctx.self_address, "timed out awaiting upstream response"),
        Err(other) => {
            warn!(peer = %next_hop, error = %other, "transport error forwarding Prepare");
            reject("T01", &ctx.self_address, "peer unreachable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilp_btp::PeerConnection;
    use ilp_types::{Fulfill, PeerConnectionState};

    fn test_prepare(destination: &str, expires_at: chrono::DateTime<Utc>) -> Prepare {
        Prepare {
            amount: 1_000_000,
            expires_at,
            execution_condition: [7u8; 32],
            destination: IlpAddress::parse(destination).unwrap(),
            data: Vec::new().into(),
        }
    }

    fn test_ctx(local_sink: Arc<dyn LocalSink>) -> (HandlerContext, Arc<RoutingTable>, Arc<PeerRegistry>) {
        let routing = Arc::new(RoutingTable::new());
        let peers = Arc::new(PeerRegistry::new());
        let ctx = HandlerContext {
            routing: routing.clone(),
            peers: peers.clone(),
            fee: FeeConfig {
                rate: 0.001,
                min_forwarded_amount: 0,
                max_hold_time_ms: 30_000,
                min_hold_time_ms: 1_000,
            },
            local_sink,
            self_address: IlpAddress::parse("g.hub").unwrap(),
        };
        (ctx, routing, peers)
    }

    struct UnreachableSink;
    #[async_trait]
    impl LocalSink for UnreachableSink {
        async fn deliver(&self, _prepare: &Prepare, _source_peer: &PeerId) -> IlpFulfillment {
            panic!("local sink should not be invoked in this test")
        }
    }

    #[tokio::test]
    async fn expired_on_arrival_rejects_without_forwarding() {
        let (ctx, _routing, _peers) = test_ctx(Arc::new(UnreachableSink));
        let prepare = test_prepare("g.hub.alice", Utc::now() - chrono::Duration::seconds(1));
        let result = handle_prepare(prepare, "p1".to_string(), &ctx).await;
        assert_eq!(
            result,
            IlpFulfillment::Reject(Reject::new("R00", "g.hub", "transfer timed out", Vec::new()))
        );
    }

    #[tokio::test]
    async fn unreachable_destination_is_rejected() {
        let (ctx, _routing, _peers) = test_ctx(Arc::new(UnreachableSink));
        let prepare = test_prepare("g.nonexistent", Utc::now() + chrono::Duration::seconds(30));
        let result = handle_prepare(prepare, "p1".to_string(), &ctx).await;
        assert_eq!(
            result,
            IlpFulfillment::Reject(Reject::new("F02", "g.hub", "no route to destination", Vec::new()))
        );
    }

    #[tokio::test]
    async fn reflecting_to_the_source_peer_is_rejected() {
        let (ctx, routing, _peers) = test_ctx(Arc::new(UnreachableSink));
        routing.add(&IlpAddress::parse("g.hub.alice").unwrap(), "p1".to_string(), 0);
        let prepare = test_prepare("g.hub.alice", Utc::now() + chrono::Duration::seconds(30));
        let result = handle_prepare(prepare, "p1".to_string(), &ctx).await;
        assert_eq!(
            result,
            IlpFulfillment::Reject(Reject::new("F02", "g.hub", "next hop is the source peer", Vec::new()))
        );
    }

    struct EchoSink;
    #[async_trait]
    impl LocalSink for EchoSink {
        async fn deliver(&self, prepare: &Prepare, _source_peer: &PeerId) -> IlpFulfillment {
            IlpFulfillment::Fulfill(Fulfill {
                fulfillment: [9u8; 32],
                data: prepare.data.clone(),
            })
        }
    }

    #[tokio::test]
    async fn local_delivery_short_circuits_forwarding() {
        let (ctx, routing, _peers) = test_ctx(Arc::new(EchoSink));
        routing.add(
            &IlpAddress::parse("g.hub.alice").unwrap(),
            LOCAL_SINK_PEER_ID.to_string(),
            0,
        );
        let prepare = test_prepare("g.hub.alice", Utc::now() + chrono::Duration::seconds(30));
        let result = handle_prepare(prepare, "p1".to_string(), &ctx).await;
        assert!(matches!(result, IlpFulfillment::Fulfill(_)));
    }

    /// Reproduces a five-hop fee cascade by applying the literal
    /// `floor(amount * (1 - rate))` formula at each hop. See DESIGN.md for
    /// why this formula, rather than nearest-integer rounding, is treated
    /// as canonical.
    #[test]
    fn fee_cascade_matches_the_floor_formula() {
        let fee = FeeConfig {
            rate: 0.001,
            min_forwarded_amount: 0,
            max_hold_time_ms: 30_000,
            min_hold_time_ms: 1_000,
        };
        let mut amount = 1_000_000u64;
        let mut seen = vec![amount];
        for _ in 0..4 {
            amount = fee.forwarded_amount(amount);
            seen.push(amount);
        }
        assert_eq!(seen, vec![1_000_000, 999_000, 998_001, 997_002, 996_004]);
    }

    #[tokio::test]
    async fn forwarding_peer_not_connected_is_transient_error() {
        let (ctx, routing, _peers) = test_ctx(Arc::new(UnreachableSink));
        routing.add(&IlpAddress::parse("g.remote").unwrap(), "p2".to_string(), 0);
        let prepare = test_prepare("g.remote", Utc::now() + chrono::Duration::seconds(30));
        let result = handle_prepare(prepare, "p1".to_string(), &ctx).await;
        assert_eq!(
            result,
            IlpFulfillment::Reject(Reject::new("T01", "g.hub", "next hop peer is not connected", Vec::new()))
        );
    }

    /// An upstream Fulfill whose preimage doesn't satisfy the execution
    /// condition is converted into `F05_WRONG_CONDITION` rather than passed
    /// through.
    #[tokio::test]
    async fn tampered_fulfillment_is_converted_to_wrong_condition_reject() {
        let (ctx, routing, peers) = test_ctx(Arc::new(UnreachableSink));
        routing.add(&IlpAddress::parse("g.remote").unwrap(), "p2".to_string(), 0);

        let (conn, mut outbound_rx) = PeerConnection::new("p2".to_string(), 8);
        conn.set_state(PeerConnectionState::Authenticated).await;
        peers.insert(Arc::new(conn));

        // Simulate P5 returning a bogus fulfillment: read the forwarded
        // request, then answer with a Fulfill that does not hash to the
        // original execution condition.
        let reconnected = peers.get("p2").unwrap();
        tokio::spawn(async move {
            let sent_bytes = outbound_rx.recv().await.unwrap();
            let decoded = ilp_btp::frame::decode_frame(&sent_bytes).unwrap();
            let bogus_fulfill = Fulfill {
                fulfillment: [0u8; 32],
                data: Vec::new().into(),
            };
            let response = BtpFrame::response(
                decoded.request_id,
                Vec::new(),
                Some(serialize(&IlpPacket::Fulfill(bogus_fulfill)).into()),
            );
            reconnected.resolve_response(response);
        });

        let prepare = test_prepare("g.remote", Utc::now() + chrono::Duration::seconds(30));
        let result = handle_prepare(prepare, "p1".to_string(), &ctx).await;
        assert_eq!(
            result,
            IlpFulfillment::Reject(Reject::new("F05", "g.hub", "wrong condition", Vec::new()))
        );
    }
}
