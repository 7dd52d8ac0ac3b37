//! Exponential backoff with jitter for peer reconnection.

use std::time::Duration;

use rand::Rng;

const INITIAL: Duration = Duration::from_secs(1);
const CAP: Duration = Duration::from_secs(30);
const JITTER_FRACTION: f64 = 0.2;

/// Tracks the backoff state for one peer's reconnect loop.
///
/// `next()` doubles the base delay (capped at 30s) each call and applies
/// +-20% jitter; `reset()` returns to the initial 1s base after a successful
/// connection.
pub struct Backoff {
    base: Duration,
}

impl Backoff {
    pub fn new() -> Self {
        Self { base: INITIAL }
    }

    pub fn reset(&mut self) {
        self.base = INITIAL;
    }

    /// The delay to wait before the next reconnect attempt, jittered.
    pub fn next(&mut self) -> Duration {
        let jittered = jitter(self.base);
        self.base = (self.base * 2).min(CAP);
        jittered
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

fn jitter(base: Duration) -> Duration {
    let mut rng = rand::rng();
    let factor = rng.random_range(1.0 - JITTER_FRACTION..=1.0 + JITTER_FRACTION);
    Duration::from_secs_f64(base.as_secs_f64() * factor)
}
