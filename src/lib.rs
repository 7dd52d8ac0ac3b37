//! Interledger connector node: packet forwarding, BTP peering, and
//! multi-chain claim settlement.
//!
//! - [`config`] — CLI/JSON configuration loading and peer secret resolution.
//! - [`telemetry`] — structured logging and optional OTLP export.
//! - [`sig_down`] — graceful shutdown on SIGTERM/SIGINT.
//! - [`admin`] — the typed admin surface (peers, routes, settlement) over HTTP.
//! - [`btp_server`] — the inbound BTP WebSocket upgrade endpoint.
//! - [`local_sink`] — the local-delivery stub invoked when a route terminates here.

pub mod admin;
pub mod btp_server;
pub mod config;
pub mod local_sink;
pub mod sig_down;
pub mod telemetry;
