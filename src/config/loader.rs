//! Configuration loading from disk and the process environment.
//!
//! Loading runs before the log subscriber exists, so overrides that are
//! ignored are returned to the caller instead of being logged here.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::config::schema::{Environment, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// An environment override that was present but unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredOverride {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for IgnoredOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring invalid {}: '{}'", self.var, self.value)
    }
}

/// The effective configuration and the overrides that were skipped.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: ProxyConfig,
    pub ignored: Vec<IgnoredOverride>,
}

impl ResolvedConfig {
    /// Report skipped overrides; call once logging is initialised.
    pub fn log_ignored(&self) {
        for ignored in &self.ignored {
            tracing::warn!(var = ignored.var, value = %ignored.value, "Ignoring invalid environment override");
        }
    }
}

/// Resolve the effective configuration: optional file, then environment
/// overrides, then validation.
pub fn resolve_config(path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    resolve_with(path, |var| std::env::var(var).ok())
}

fn resolve_with<F>(path: Option<&Path>, lookup: F) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    let resolved = apply_env_overrides(config, lookup)?;
    validate_config(&resolved.config).map_err(ConfigError::Validation)?;
    Ok(resolved)
}

/// Apply `PORT`, `COOKIE_EXPIRY` and `APP_ENV`/`NODE_ENV` overrides.
///
/// `lookup` abstracts the environment so tests need not mutate process state.
/// A bad `PORT` is an error; a bad expiry or environment flag is skipped.
pub fn apply_env_overrides<F>(mut config: ProxyConfig, lookup: F) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut ignored = Vec::new();

    if let Some(value) = lookup("PORT") {
        config.listener.port = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var: "PORT", value })?;
    }

    if let Some(value) = lookup("COOKIE_EXPIRY") {
        match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => config.session.ttl_ms = ms,
            _ => ignored.push(IgnoredOverride {
                var: "COOKIE_EXPIRY",
                value,
            }),
        }
    }

    for var in ["APP_ENV", "NODE_ENV"] {
        if let Some(value) = lookup(var) {
            match Environment::from_flag(&value) {
                Some(env) => {
                    config.observability.environment = env;
                    break;
                }
                None => ignored.push(IgnoredOverride { var, value }),
            }
        }
    }

    Ok(ResolvedConfig { config, ignored })
}
