//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fetch for a cache key:
//!     → single_flight.rs (join an identical fetch already in progress)
//!     → retries.rs (attempt, back off, run recovery hook, attempt again)
//!     → backoff.rs (exponential or linear delay for the gap)
//! ```
//!
//! # Design Decisions
//! - Timeouts live in the transport; every upstream call has a deadline
//! - The retry policy is decoupled from the transport and from session repair
//! - Backoff has no jitter so schedules are exact and testable

pub mod backoff;
pub mod retries;
pub mod single_flight;

pub use backoff::Backoff;
pub use retries::{retry_with_recovery, RetryExhausted, RetryPolicy};
pub use single_flight::SingleFlight;
