//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin allow-list, preflight answers)
//!     → Pass to routes
//! ```
//!
//! # Design Decisions
//! - Unknown origins are not rejected; the browser enforces the missing header

pub mod cors;

pub use cors::cors_layer;
