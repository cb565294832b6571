//! Reconnect backoff
//!
//! Exponential growth from a base delay, capped at a maximum, with ±20%
//! jitter so a fleet of clients does not reconnect in lockstep.

use rand::Rng;
use std::time::Duration;

/// Jitter applied to every computed delay (fraction of the raw delay)
const JITTER_FACTOR: f64 = 0.2;

/// Paces reconnection attempts
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    /// Create a backoff controller with the given base and cap
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Number of failures since the last recorded success
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay before the given attempt, without jitter
    #[must_use]
    pub fn raw_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;

        let exp = base_ms.saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX));
        Duration::from_millis(exp.min(max_ms))
    }

    /// Compute the next delay and advance the attempt counter
    ///
    /// Jitter of ±20% is applied to the exponential value; the result
    /// never exceeds the configured maximum.
    pub fn next_delay(&mut self) -> Duration {
        let raw = self.raw_delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        let factor = rand::thread_rng().gen_range(1.0 - JITTER_FACTOR..=1.0 + JITTER_FACTOR);
        let jittered = Duration::from_millis((raw.as_millis() as f64 * factor) as u64);

        jittered.min(self.max)
    }

    /// Reset the attempt counter after a stably-running connection
    pub fn record_success(&mut self) {
        if self.attempt > 0 {
            tracing::debug!(attempts = self.attempt, "Backoff reset after stable connection");
        }
        self.attempt = 0;
    }
}
