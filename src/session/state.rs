//! Session cookie state.

use std::time::Duration;

use tokio::time::Instant;

/// The cookie obtained by the last successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// `name=value` pairs joined with `; `. Never empty.
    pub cookie: String,
    pub acquired_at: Instant,
    /// Increments on every successful handshake.
    pub generation: u64,
}

impl SessionState {
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.acquired_at) < ttl
    }
}

/// Every handshake attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session acquisition failed after {attempts} attempts: {last}")]
pub struct SessionAcquisitionError {
    pub attempts: u32,
    pub last: crate::upstream::UpstreamError,
}
