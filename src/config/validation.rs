//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTLs > 0, attempts > 0, delays ordered)
//! - Check that URLs and origins parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must not be smaller than {lower}")]
    Inverted { field: &'static str, lower: &'static str },

    #[error("upstream.base_url '{0}' is not a valid URL")]
    BaseUrl(String),

    #[error("cors origin '{0}' is not a valid origin")]
    Origin(String),
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let non_zero: [(&'static str, u64); 7] = [
        ("listener.port", config.listener.port as u64),
        ("upstream.timeout_secs", config.upstream.timeout_secs),
        ("session.ttl_ms", config.session.ttl_ms),
        ("session.max_attempts", config.session.max_attempts as u64),
        ("cache.ttl_ms", config.cache.ttl_ms),
        ("retries.max_attempts", config.retries.max_attempts as u64),
        ("listener.request_timeout_secs", config.listener.request_timeout_secs),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.retries.max_delay_ms < config.retries.base_delay_ms {
        errors.push(ValidationError::Inverted {
            field: "retries.max_delay_ms",
            lower: "retries.base_delay_ms",
        });
    }
    if config.session.max_delay_ms < config.session.base_delay_ms {
        errors.push(ValidationError::Inverted {
            field: "session.max_delay_ms",
            lower: "session.base_delay_ms",
        });
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if url.has_host() => {}
        _ => errors.push(ValidationError::BaseUrl(config.upstream.base_url.clone())),
    }

    for origin in &config.cors.allowed_origins {
        let parses = Url::parse(origin).map(|u| u.has_host()).unwrap_or(false);
        if !parses || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ProxyConfig::default();
        config.cache.ttl_ms = 0;
        config.retries.max_attempts = 0;
        config.retries.max_delay_ms = 10;
        config.upstream.base_url = "not a url".into();
        config.cors.allowed_origins.push("localhost".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::Zero { field: "cache.ttl_ms" }));
        assert!(errors.contains(&ValidationError::Zero { field: "retries.max_attempts" }));
        assert!(errors.contains(&ValidationError::Origin("localhost".into())));
    }
}
