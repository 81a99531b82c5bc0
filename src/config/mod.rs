//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (PORT / COOKIE_EXPIRY / NODE_ENV overrides)
//!     → validation.rs (semantic checks)
//!     → ResolvedConfig (validated ProxyConfig + ignored overrides,
//!       logged once the subscriber is installed)
//!     → cloned into each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_config, ConfigError, IgnoredOverride, ResolvedConfig};
pub use schema::{
    CacheConfig, CorsConfig, Environment, ListenerConfig, ObservabilityConfig, ProxyConfig,
    RetryConfig, SessionConfig, UpstreamConfig,
};
