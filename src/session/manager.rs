//! Upstream session acquisition and refresh.
//!
//! # Responsibilities
//! - Perform the landing + status handshake and capture cookies
//! - Reuse the cookie until it is older than the session TTL
//! - Hand out the browser header set with the current cookie
//!
//! # Design Decisions
//! - One async mutex guards the state; handshakes never run concurrently
//! - A forced refresh is skipped if another caller already replaced the
//!   session the failing request used

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::{SessionConfig, UpstreamConfig};
use crate::observability::metrics;
use crate::resilience::retries::{no_recovery, retry_with_recovery, RetryPolicy};
use crate::session::state::{SessionAcquisitionError, SessionState};
use crate::upstream::headers::{browser_headers, join_cookies, with_cookie, with_referer};
use crate::upstream::{Transport, UpstreamError, UpstreamRequest};

/// Headers for one upstream call, tagged with the session they carry.
#[derive(Debug, Clone)]
pub struct SessionHeaders {
    pub headers: HeaderMap,
    pub generation: u64,
}

pub struct SessionManager {
    transport: Arc<dyn Transport>,
    config: SessionConfig,
    landing_url: String,
    status_url: String,
    base_headers: HeaderMap,
    state: Mutex<Option<SessionState>>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        upstream: &UpstreamConfig,
        config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            config,
            landing_url: upstream.landing_url(),
            status_url: upstream.status_url(),
            base_headers: browser_headers(&upstream.user_agent),
            state: Mutex::new(None),
        }
    }

    /// Headers carrying a fresh session cookie, handshaking first if needed.
    pub async fn acquire_headers(&self) -> Result<SessionHeaders, SessionAcquisitionError> {
        let mut state = self.state.lock().await;
        if let Some(current) = state.as_ref() {
            if current.is_fresh(Instant::now(), self.config.ttl()) {
                return Ok(self.headers_for(current));
            }
            tracing::debug!(generation = current.generation, "Session cookie expired");
        }

        let next = self.handshake_with_retries(state.as_ref()).await?;
        let headers = self.headers_for(&next);
        *state = Some(next);
        Ok(headers)
    }

    /// Force a new handshake.
    ///
    /// `observed` is the generation the failing request used. If a newer
    /// session has been stored since, that one is returned instead.
    pub async fn refresh(
        &self,
        observed: Option<u64>,
    ) -> Result<SessionHeaders, SessionAcquisitionError> {
        let mut state = self.state.lock().await;
        if let (Some(current), Some(observed)) = (state.as_ref(), observed) {
            if current.generation != observed && current.is_fresh(Instant::now(), self.config.ttl()) {
                tracing::debug!(
                    generation = current.generation,
                    "Session already refreshed by another request"
                );
                return Ok(self.headers_for(current));
            }
        }

        let next = self.handshake_with_retries(state.as_ref()).await?;
        let headers = self.headers_for(&next);
        *state = Some(next);
        Ok(headers)
    }

    /// Snapshot of the current session, fresh or not.
    pub async fn current(&self) -> Option<SessionState> {
        self.state.lock().await.clone()
    }

    /// The URL sent as `Referer` on API calls.
    pub fn landing_url(&self) -> &str {
        &self.landing_url
    }

    fn headers_for(&self, state: &SessionState) -> SessionHeaders {
        SessionHeaders {
            headers: with_cookie(&self.base_headers, &state.cookie),
            generation: state.generation,
        }
    }

    async fn handshake_with_retries(
        &self,
        previous: Option<&SessionState>,
    ) -> Result<SessionState, SessionAcquisitionError> {
        let policy = RetryPolicy::exponential(
            self.config.max_attempts,
            self.config.base_delay_ms,
            self.config.max_delay_ms,
        );

        let cookie = retry_with_recovery(
            &policy,
            |attempt| async move {
                tracing::info!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    "Fetching new session cookie"
                );
                let result = self.handshake().await;
                metrics::record_handshake(result.is_ok());
                result
            },
            no_recovery,
        )
        .await
        .map_err(|e| {
            tracing::error!(attempts = e.attempts, error = %e.last, "All session handshakes failed");
            SessionAcquisitionError {
                attempts: e.attempts,
                last: e.last,
            }
        })?;

        let generation = previous.map_or(1, |p| p.generation + 1);
        tracing::info!(generation, "Session cookie acquired");
        Ok(SessionState {
            cookie,
            acquired_at: Instant::now(),
            generation,
        })
    }

    async fn handshake(&self) -> Result<String, UpstreamError> {
        let landing = self
            .transport
            .get(UpstreamRequest::get(&self.landing_url, self.base_headers.clone()).following_redirects())
            .await?;
        if !landing.is_success_or_redirect() {
            return Err(UpstreamError::Status(landing.status));
        }

        tokio::time::sleep(Duration::from_millis(self.config.pacing_ms)).await;

        let status = self
            .transport
            .get(UpstreamRequest::get(
                &self.status_url,
                with_referer(&self.base_headers, &self.landing_url),
            ))
            .await?;
        if !status.is_success() {
            return Err(UpstreamError::Status(status.status));
        }

        join_cookies(landing.set_cookies.iter().chain(status.set_cookies.iter()))
            .ok_or(UpstreamError::NoSessionCookie)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("landing_url", &self.landing_url)
            .field("status_url", &self.status_url)
            .field("ttl_ms", &self.config.ttl_ms)
            .finish()
    }
}
