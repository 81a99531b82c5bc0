//! Scripted in-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::upstream::client::Transport;
use crate::upstream::types::{UpstreamError, UpstreamRequest, UpstreamResponse};

pub(crate) type Scripted = Result<UpstreamResponse, UpstreamError>;

/// Replays scripted results per exact URL and records every request.
///
/// The last scripted result for a URL repeats once the queue drains.
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<(Instant, UpstreamRequest)>>,
    created: Instant,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            created: Instant::now(),
        }
    }

    pub(crate) fn on(self, url: &str, results: Vec<Scripted>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), results.into());
        self
    }

    pub(crate) fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub(crate) fn count(&self, url: &str) -> usize {
        self.offsets(url).len()
    }

    /// When each request to `url` was made, relative to construction.
    pub(crate) fn offsets(&self, url: &str) -> Vec<Duration> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.url == url)
            .map(|(at, _)| at.duration_since(self.created))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push((Instant::now(), request));

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(UpstreamError::Network(format!("unscripted {url}")))),
            None => Err(UpstreamError::Network(format!("unscripted {url}"))),
        }
    }
}

pub(crate) fn ok(body: &str) -> Scripted {
    Ok(UpstreamResponse {
        status: 200,
        set_cookies: Vec::new(),
        body: body.to_string(),
    })
}

pub(crate) fn with_cookies(status: u16, cookies: &[&str]) -> Scripted {
    Ok(UpstreamResponse {
        status,
        set_cookies: cookies.iter().map(|c| c.to_string()).collect(),
        body: String::new(),
    })
}

pub(crate) fn status(code: u16) -> Scripted {
    Ok(UpstreamResponse {
        status: code,
        set_cookies: Vec::new(),
        body: String::new(),
    })
}

pub(crate) fn network_error() -> Scripted {
    Err(UpstreamError::Network("connection reset".into()))
}
