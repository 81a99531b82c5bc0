//! Upstream provider integration.
//!
//! # Data Flow
//! ```text
//! SessionManager / ResilientFetcher
//!     → headers.rs (browser header set, Referer, Cookie)
//!     → client.rs (Transport::get, reqwest with 30s timeout)
//!     → types.rs (UpstreamResponse → JSON payload or UpstreamError)
//! ```
//!
//! # Design Decisions
//! - The transport reports every HTTP status; callers decide what counts as success
//! - Redirects are followed only on the landing request
//! - `Transport` is a trait so the core can run against a scripted transport

pub mod client;
pub mod endpoints;
pub mod headers;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{HttpTransport, Transport};
pub use endpoints::Endpoints;
pub use types::{UpstreamError, UpstreamRequest, UpstreamResponse};
