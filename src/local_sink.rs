//! The local-delivery interface consumed by the packet handler when a route
//! names the local sink.
//!
//! This node has no application payee to deliver to: SPSP/STREAM receiver
//! logic lives outside the connector. Routes pointing at the local sink are
//! rejected rather than silently accepted; a node embedding an application
//! receiver would replace this with its own `LocalSink` implementation.

use async_trait::async_trait;
use ilp_packet_handler::LocalSink;
use ilp_types::{IlpFulfillment, PeerId, Prepare, Reject};
use tracing::warn;

pub struct NoLocalReceiver {
    pub self_address: String,
}

#[async_trait]
impl LocalSink for NoLocalReceiver {
    async fn deliver(&self, prepare: &Prepare, source_peer: &PeerId) -> IlpFulfillment {
        warn!(
            %source_peer,
            destination = %prepare.destination.as_str(),
            "route names the local sink but no application receiver is configured"
        );
        IlpFulfillment::Reject(Reject::new(
            "F02",
            &self.self_address,
            "no local receiver configured",
            Vec::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ilp_types::IlpAddress;

    #[tokio::test]
    async fn always_rejects_with_no_receiver_configured() {
        let sink = NoLocalReceiver {
            self_address: "g.hub".to_string(),
        };
        let prepare = Prepare {
            amount: 100,
            expires_at: Utc::now() + chrono::Duration::seconds(30),
            execution_condition: [0u8; 32],
            destination: IlpAddress::parse("g.hub.alice").unwrap(),
            data: Vec::new().into(),
        };
        let result = sink.deliver(&prepare, &"peer1".to_string()).await;
        assert_eq!(
            result,
            IlpFulfillment::Reject(Reject::new("F02", "g.hub", "no local receiver configured", Vec::new()))
        );
    }
}
