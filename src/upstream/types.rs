//! Upstream request/response types and errors.

use reqwest::header::HeaderMap;
use serde_json::Value;

/// A single GET against the provider.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: String,
    pub headers: HeaderMap,
    /// Follow redirects (landing request only).
    pub follow_redirects: bool,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            url: url.into(),
            headers,
            follow_redirects: false,
        }
    }

    pub fn following_redirects(mut self) -> Self {
        self.follow_redirects = true;
        self
    }
}

/// What the transport saw, regardless of status.
#[derive(Debug, Clone, Default)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Raw `Set-Cookie` header values, in order of appearance.
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Accepts any status in `[200, 400)`, as the landing request does.
    pub fn is_success_or_redirect(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// Decode the body of a successful API response.
    ///
    /// Non-2xx statuses, empty bodies and JSON `null` all count as failures.
    pub fn into_payload(self) -> Result<Value, UpstreamError> {
        if !self.is_success() {
            return Err(UpstreamError::Status(self.status));
        }
        if self.body.trim().is_empty() {
            return Err(UpstreamError::EmptyBody);
        }
        match serde_json::from_str::<Value>(&self.body) {
            Ok(Value::Null) => Err(UpstreamError::EmptyBody),
            Ok(value) => Ok(value),
            Err(e) => Err(UpstreamError::Decode(e.to_string())),
        }
    }
}

/// Transport-level and response-level failures.
///
/// `Clone` so one outcome can be shared with every coalesced caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("upstream returned an empty body")]
    EmptyBody,

    #[error("failed to decode upstream body: {0}")]
    Decode(String),

    #[error("handshake returned no session cookie")]
    NoSessionCookie,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> UpstreamResponse {
        UpstreamResponse {
            status,
            set_cookies: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_payload_classification() {
        assert_eq!(
            response(200, r#"{"data":[]}"#).into_payload().unwrap(),
            serde_json::json!({"data": []})
        );
        assert_eq!(response(401, "{}").into_payload(), Err(UpstreamError::Status(401)));
        assert_eq!(response(200, "  ").into_payload(), Err(UpstreamError::EmptyBody));
        assert_eq!(response(200, "null").into_payload(), Err(UpstreamError::EmptyBody));
        assert!(matches!(
            response(200, "<html>").into_payload(),
            Err(UpstreamError::Decode(_))
        ));
    }

    #[test]
    fn test_landing_status_window() {
        assert!(response(302, "").is_success_or_redirect());
        assert!(!response(302, "").is_success());
        assert!(!response(403, "").is_success_or_redirect());
    }
}
