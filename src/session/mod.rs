//! Upstream session subsystem.
//!
//! # Data Flow
//! ```text
//! acquire_headers()
//!     → state fresh? → browser headers + Cookie
//!     → otherwise handshake:
//!         GET landing (≤5 redirects, 2xx/3xx accepted)
//!         sleep pacing delay
//!         GET status resource with Referer: landing
//!         collect Set-Cookie pairs from both → SessionState
//!     → on failure: exponential backoff, up to max_attempts
//! ```

pub mod manager;
pub mod state;

pub use manager::{SessionHeaders, SessionManager};
pub use state::{SessionAcquisitionError, SessionState};
