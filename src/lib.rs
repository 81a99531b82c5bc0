//! NSE market-data proxy.
//!
//! Serves browser front-ends with market data from the National Stock
//! Exchange of India, whose API only answers clients that look like a browser
//! holding a recent session cookie.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http (axum routes, CORS, request ID)
//!                        │
//!                        ▼
//!                    fetch::ResilientFetcher ──▶ cache::CacheStore
//!                        │        ▲
//!                        │        └── resilience (backoff, retry, single-flight)
//!                        ▼
//!                    session::SessionManager (landing + status handshake)
//!                        │
//!                        ▼
//!                    upstream::Transport (reqwest) ──────────▶ NSE
//!
//!     Cross-cutting: config, observability, lifecycle, security
//! ```

// Core subsystems
pub mod cache;
pub mod config;
pub mod fetch;
pub mod http;
pub mod market;
pub mod session;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
