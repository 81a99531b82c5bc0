//! Upstream HTTP transport.
//!
//! # Responsibilities
//! - Issue GET requests to the provider with a bounded timeout
//! - Follow redirects only when the request asks for it
//! - Surface status, `Set-Cookie` values and body without judging them

use async_trait::async_trait;
use reqwest::header::SET_COOKIE;
use reqwest::redirect::Policy;

use crate::config::UpstreamConfig;
use crate::upstream::types::{UpstreamError, UpstreamRequest, UpstreamResponse};

/// The seam between the resilient-fetch core and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one GET. Any HTTP status is `Ok`; only transport failures are `Err`.
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// reqwest-backed transport used in production.
#[derive(Clone)]
pub struct HttpTransport {
    /// Follows up to `landing_max_redirects` hops.
    navigating: reqwest::Client,
    /// Never follows redirects.
    api: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let build = |policy: Policy| {
            reqwest::Client::builder()
                .timeout(config.timeout())
                .pool_idle_timeout(config.timeout())
                .tcp_keepalive(config.timeout())
                .danger_accept_invalid_certs(config.accept_invalid_certs)
                .redirect(policy)
                .build()
        };

        Ok(Self {
            navigating: build(Policy::limited(config.landing_max_redirects))?,
            api: build(Policy::none())?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let client = if request.follow_redirects {
            &self.navigating
        } else {
            &self.api
        };

        let response = client
            .get(&request.url)
            .headers(request.headers)
            .send()
            .await?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_owned)
            .collect();
        let body = response.text().await?;

        tracing::trace!(url = %request.url, status, bytes = body.len(), "Upstream response");

        Ok(UpstreamResponse {
            status,
            set_cookies,
            body,
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}
