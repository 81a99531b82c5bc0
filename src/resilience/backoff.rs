//! Backoff schedules between retry attempts.
//!
//! Attempts are zero-based: the delay after attempt `i` fails is `delay(i)`.

use std::time::Duration;

/// Delay schedule applied between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `min(base * 2^attempt, max)`.
    Exponential { base_ms: u64, max_ms: u64 },
    /// `step * (attempt + 1)`.
    Linear { step_ms: u64 },
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Exponential { base_ms, max_ms } => exponential_backoff(attempt, base_ms, max_ms),
            Backoff::Linear { step_ms } => linear_backoff(attempt, step_ms),
        }
    }
}

/// Calculate capped exponential backoff delay.
pub fn exponential_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Calculate linear backoff delay.
pub fn linear_backoff(attempt: u32, step_ms: u64) -> Duration {
    Duration::from_millis(step_ms.saturating_mul(attempt as u64 + 1))
}
