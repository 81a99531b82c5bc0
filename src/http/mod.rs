//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request_id.rs (x-request-id assigned, echoed on the response)
//!     → server.rs (trace span, timeout, CORS, latency metrics)
//!     → handlers.rs (provider URL → ResilientFetcher → market::models)
//!     → outcome.rs (200 body, degraded empty body, or 500 with a fixed message)
//!     → Send to client
//! ```

pub mod handlers;
pub mod outcome;
pub mod request_id;
pub mod server;

pub use outcome::Outcome;
pub use request_id::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
