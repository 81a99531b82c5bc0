//! Cache-aware, session-repairing upstream fetches.
//!
//! Two policies:
//! - `cached_fetch`: cache first, exponential backoff, result stored by key
//! - `uncached_fetch`: per-parameter resources, linear backoff, nothing stored
//!
//! Both refresh the session between attempts; an expired cookie is the most
//! common reason the provider rejects a request.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::time::Instant;

use crate::cache::{CacheKey, CacheStore};
use crate::config::RetryConfig;
use crate::fetch::error::FetchError;
use crate::observability::metrics;
use crate::resilience::{retry_with_recovery, RetryPolicy, SingleFlight};
use crate::session::SessionManager;
use crate::upstream::headers::with_referer;
use crate::upstream::{Transport, UpstreamRequest, UpstreamResponse};

/// A failed attempt and the session generation it used, if any.
struct AttemptFailure {
    error: FetchError,
    generation: Option<u64>,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    sessions: Arc<SessionManager>,
    cache: CacheStore,
    flights: SingleFlight<CacheKey, Result<Value, FetchError>>,
    config: RetryConfig,
}

impl ResilientFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        sessions: Arc<SessionManager>,
        cache: CacheStore,
        config: RetryConfig,
    ) -> Self {
        Self {
            transport,
            sessions,
            cache,
            flights: SingleFlight::new(),
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// `cached_fetch_with` using the configured attempt count.
    pub async fn cached_fetch(&self, url: &str, key: CacheKey) -> Result<Value, FetchError> {
        self.cached_fetch_with(url, key, self.config.max_attempts).await
    }

    /// Return the cached payload for `key` if fresh, otherwise fetch `url`
    /// with retries and store the result under `key`.
    pub async fn cached_fetch_with(
        &self,
        url: &str,
        key: CacheKey,
        max_retries: u32,
    ) -> Result<Value, FetchError> {
        if let Some(entry) = self.cache.get(key, Instant::now()) {
            tracing::debug!(cache_key = %key, "Using cached data");
            return Ok(entry.value);
        }

        if !self.config.coalesce {
            return self.fetch_and_store(url, key, max_retries).await;
        }

        let this = self.clone();
        let url = url.to_string();
        let joined = self
            .flights
            .run(key, move || async move {
                this.fetch_and_store(&url, key, max_retries).await
            })
            .await;

        if joined.shared {
            tracing::debug!(cache_key = %key, "Joined in-flight fetch");
            metrics::record_singleflight_join(key.as_str());
        }
        joined.value.unwrap_or(Err(FetchError::Interrupted(key)))
    }

    async fn fetch_and_store(
        &self,
        url: &str,
        key: CacheKey,
        max_retries: u32,
    ) -> Result<Value, FetchError> {
        // A flight that finished between our cache check and now already stored it.
        // Peek so the lookup metric counts one miss per caller.
        if let Some(entry) = self
            .cache
            .peek(key)
            .filter(|e| e.is_fresh(Instant::now(), self.cache.ttl()))
        {
            return Ok(entry.value);
        }

        let policy = RetryPolicy::exponential(
            max_retries,
            self.config.base_delay_ms,
            self.config.max_delay_ms,
        );

        let result = retry_with_recovery(
            &policy,
            |attempt| async move {
                tracing::info!(
                    cache_key = %key,
                    attempt = attempt + 1,
                    max_attempts = max_retries,
                    "Fetching data"
                );
                self.attempt(url, true, "cached").await
            },
            |_, failure: &AttemptFailure| self.repair_session(failure.generation),
        )
        .await;

        match result {
            Ok(value) => {
                self.cache.put(key, value.clone(), Instant::now());
                tracing::info!(cache_key = %key, "Data fetched successfully");
                Ok(value)
            }
            Err(exhausted) => {
                metrics::record_exhausted("cached");
                tracing::error!(
                    cache_key = %key,
                    attempts = exhausted.attempts,
                    error = %exhausted.last,
                    "Fetch retries exhausted"
                );
                Err(FetchError::Exhausted {
                    cache_key: key,
                    attempts: exhausted.attempts,
                    last: Box::new(exhausted.last.error),
                })
            }
        }
    }

    /// `uncached_fetch_with` using the configured attempt count.
    pub async fn uncached_fetch(&self, url: &str) -> Result<Value, FetchError> {
        self.uncached_fetch_with(url, self.config.max_attempts).await
    }

    /// Fetch `url` without touching the cache, backing off linearly.
    ///
    /// On exhaustion the last attempt's error is returned as-is.
    pub async fn uncached_fetch_with(&self, url: &str, max_retries: u32) -> Result<Value, FetchError> {
        let policy = RetryPolicy::linear(max_retries, self.config.linear_step_ms);

        retry_with_recovery(
            &policy,
            |attempt| async move {
                tracing::debug!(url, attempt = attempt + 1, "Fetching uncached resource");
                self.attempt(url, false, "uncached").await
            },
            |_, failure: &AttemptFailure| self.repair_session(failure.generation),
        )
        .await
        .map_err(|exhausted| {
            metrics::record_exhausted("uncached");
            tracing::error!(url, attempts = exhausted.attempts, error = %exhausted.last, "Request failed");
            exhausted.last.error
        })
    }

    /// One upstream GET with the current session headers.
    async fn attempt(
        &self,
        url: &str,
        referer: bool,
        policy: &'static str,
    ) -> Result<Value, AttemptFailure> {
        let session = self
            .sessions
            .acquire_headers()
            .await
            .map_err(|e| AttemptFailure {
                error: FetchError::from(e),
                generation: None,
            })?;

        let headers = if referer {
            with_referer(&session.headers, self.sessions.landing_url())
        } else {
            session.headers
        };

        let result = self
            .transport
            .get(UpstreamRequest::get(url, headers))
            .await
            .and_then(UpstreamResponse::into_payload);
        metrics::record_upstream_attempt(policy, result.is_ok());

        result.map_err(|e| AttemptFailure {
            error: FetchError::from(e),
            generation: Some(session.generation),
        })
    }

    /// Best-effort session refresh between attempts. Failures are logged only.
    async fn repair_session(&self, generation: Option<u64>) {
        if let Err(e) = self.sessions.refresh(generation).await {
            tracing::warn!(error = %e, "Failed to refresh session");
        }
    }
}

impl fmt::Debug for ResilientFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientFetcher")
            .field("sessions", &self.sessions)
            .field("cached_keys", &self.cache.len())
            .field("coalesce", &self.config.coalesce)
            .finish()
    }
}
