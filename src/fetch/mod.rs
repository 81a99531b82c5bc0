//! Resilient upstream fetching.
//!
//! # Data Flow
//! ```text
//! cached_fetch(url, key)
//!     → CacheStore::get (fresh → return)
//!     → SingleFlight (join an identical fetch in progress)
//!     → retry loop:
//!         SessionManager::acquire_headers → Transport::get → JSON payload
//!         on failure: backoff, SessionManager::refresh, try again
//!     → CacheStore::put on success
//!
//! uncached_fetch(url)
//!     → same retry loop, linear backoff, no cache, no Referer
//! ```
//!
//! # Design Decisions
//! - A failure to obtain a session counts as a failed attempt
//! - Session refresh between attempts is best-effort; its errors are logged only
//! - The cache is written only with successful payloads

pub mod error;
pub mod fetcher;

pub use error::FetchError;
pub use fetcher::ResilientFetcher;
