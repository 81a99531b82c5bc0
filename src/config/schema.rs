//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the NSE proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host and port).
    pub listener: ListenerConfig,

    /// Upstream provider endpoints and transport settings.
    pub upstream: UpstreamConfig,

    /// Session cookie lifecycle.
    pub session: SessionConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Retry configuration for data fetches.
    pub retries: RetryConfig,

    /// Browser origin allow-list.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Total time allowed for one downstream request, in seconds.
    pub request_timeout_secs: u64,
}

impl ListenerConfig {
    /// The `host:port` pair to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_secs: 120,
        }
    }
}

/// Upstream provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Provider origin, e.g. "https://www.nseindia.com".
    pub base_url: String,

    /// Landing page visited first during the handshake.
    pub landing_path: String,

    /// Lightweight resource requested second during the handshake.
    pub status_path: String,

    /// Per-request transport timeout in seconds.
    pub timeout_secs: u64,

    /// Redirect hops followed on the landing request.
    pub landing_max_redirects: usize,

    /// Browser user agent presented to the provider.
    pub user_agent: String,

    /// Accept invalid TLS certificates from the provider.
    pub accept_invalid_certs: bool,
}

impl UpstreamConfig {
    pub fn landing_url(&self) -> String {
        join_url(&self.base_url, &self.landing_path)
    }

    pub fn status_url(&self) -> String {
        join_url(&self.base_url, &self.status_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.nseindia.com".to_string(),
            landing_path: "/".to_string(),
            status_path: "/api/marketStatus".to_string(),
            timeout_secs: 30,
            landing_max_redirects: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_invalid_certs: true,
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long an acquired cookie is reused, in milliseconds.
    pub ttl_ms: u64,

    /// Handshake attempts before giving up.
    pub max_attempts: u32,

    /// Delay between the landing request and the status request.
    pub pacing_ms: u64,

    /// Base delay for handshake backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for handshake backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            max_attempts: 3,
            pacing_ms: 1000,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window for cached payloads, in milliseconds.
    pub ttl_ms: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: 5000 }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Step for the linear backoff used by uncached fetches.
    pub linear_step_ms: u64,

    /// Share one in-flight upstream call between concurrent callers of a key.
    pub coalesce: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            linear_step_ms: 1000,
            coalesce: true,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API from a browser.
    pub allowed_origins: Vec<String>,

    /// Preflight cache duration in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://stock-data-eight.vercel.app".to_string(),
            ],
            max_age_secs: 86_400,
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse the values commonly found in `NODE_ENV`/`APP_ENV`.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Deployment environment; selects the log format.
    pub environment: Environment,

    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            log_level: "nse_proxy=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
