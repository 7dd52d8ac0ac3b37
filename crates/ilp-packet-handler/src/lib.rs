//! Turns one inbound Prepare into a Fulfill or Reject: route lookup, fee
//! deduction, expiry shrink, forwarding, and response mapping.

pub mod config;
pub mod handler;

pub use config::FeeConfig;
pub use handler::{handle_prepare, HandlerContext, LocalSink, LOCAL_SINK_PEER_ID};
