//! The fee and hold-time parameters that govern forwarding.

use serde::Deserialize;

/// `rate` is a plain fraction in `[0, 1)`, e.g. `0.001` for ten basis points —
/// see DESIGN.md for why this representation was chosen over integer basis
/// points.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub min_forwarded_amount: u64,
    #[serde(default = "default_max_hold_time_ms")]
    pub max_hold_time_ms: i64,
    #[serde(default = "default_min_hold_time_ms")]
    pub min_hold_time_ms: i64,
}

fn default_max_hold_time_ms() -> i64 {
    30_000
}

fn default_min_hold_time_ms() -> i64 {
    1_000
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            rate: 0.0,
            min_forwarded_amount: 0,
            max_hold_time_ms: default_max_hold_time_ms(),
            min_hold_time_ms: default_min_hold_time_ms(),
        }
    }
}

impl FeeConfig {
    /// The amount to forward downstream after the fee is deducted, rounded
    /// down.
    pub fn forwarded_amount(&self, amount: u64) -> u64 {
        let scaled = (amount as f64) * (1.0 - self.rate);
        scaled.floor() as u64
    }
}
