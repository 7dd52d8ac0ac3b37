//! Node configuration: CLI-pointed JSON file, `BTP_PEER_<PEER_ID>_SECRET`
//! environment indirection for peer auth tokens, and ambient defaults.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use ilp_packet_handler::FeeConfig;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "ilp-connector")]
#[command(about = "Interledger connector node")]
struct CliArgs {
    /// Path to the JSON configuration file.
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerConfig {
    pub id: String,
    pub url: String,
    /// Literal auth token. When absent, resolved from
    /// `BTP_PEER_<PEER_ID>_SECRET` at load time.
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    pub prefix: String,
    pub next_hop: String,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub self_address: String,
    #[serde(default = "defaults::btp_server_port")]
    pub btp_server_port: u16,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub fee: FeeConfig,
    #[serde(default)]
    pub enable_private_messaging: bool,
    #[serde(default = "defaults::messaging_gateway_port")]
    pub messaging_gateway_port: u16,
    #[serde(default = "defaults::messaging_websocket_port")]
    pub messaging_websocket_port: u16,
}

mod defaults {
    pub fn btp_server_port() -> u16 {
        3000
    }
    pub fn messaging_gateway_port() -> u16 {
        3001
    }
    pub fn messaging_websocket_port() -> u16 {
        3002
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("peer {peer_id} has no authToken configured and {env_var} is not set")]
    MissingEnv { peer_id: String, env_var: String },
}

/// The environment variable name a given peer id's secret is resolved from.
pub fn peer_secret_env_var(peer_id: &str) -> String {
    let sanitized: String = peer_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("BTP_PEER_{sanitized}_SECRET")
}

impl NodeConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        Self::load_from_path(cli_args.config)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
        let mut config: NodeConfig = serde_json::from_str(&content)?;
        config.resolve_peer_secrets()?;
        Ok(config)
    }

    fn resolve_peer_secrets(&mut self) -> Result<(), ConfigError> {
        for peer in &mut self.peers {
            if peer.auth_token.is_none() {
                let env_var = peer_secret_env_var(&peer.id);
                let secret = std::env::var(&env_var).map_err(|_| ConfigError::MissingEnv {
                    peer_id: peer.id.clone(),
                    env_var,
                })?;
                peer.auth_token = Some(secret);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_secret_env_var_uppercases_and_sanitizes() {
        assert_eq!(peer_secret_env_var("peer-one"), "BTP_PEER_PEER_ONE_SECRET");
    }

    #[test]
    fn missing_auth_token_and_env_surfaces_missing_env() {
        let mut config = NodeConfig {
            self_address: "g.connector".to_string(),
            btp_server_port: 3000,
            peers: vec![PeerConfig {
                id: "unconfigured-peer".to_string(),
                url: "ws://localhost:4000".to_string(),
                auth_token: None,
            }],
            routes: Vec::new(),
            fee: FeeConfig::default(),
            enable_private_messaging: false,
            messaging_gateway_port: 3001,
            messaging_websocket_port: 3002,
        };
        let err = config.resolve_peer_secrets().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv { .. }));
    }

    #[test]
    fn literal_auth_token_is_kept_as_is() {
        let mut config = NodeConfig {
            self_address: "g.connector".to_string(),
            btp_server_port: 3000,
            peers: vec![PeerConfig {
                id: "peer1".to_string(),
                url: "ws://localhost:4000".to_string(),
                auth_token: Some("literal-secret".to_string()),
            }],
            routes: Vec::new(),
            fee: FeeConfig::default(),
            enable_private_messaging: false,
            messaging_gateway_port: 3001,
            messaging_websocket_port: 3002,
        };
        config.resolve_peer_secrets().unwrap();
        assert_eq!(config.peers[0].auth_token.as_deref(), Some("literal-secret"));
    }
}
