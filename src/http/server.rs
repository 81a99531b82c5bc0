//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared upstream stack (transport, session, cache, fetcher)
//! - Create the Axum router with all route handlers
//! - Wire up middleware (request ID, tracing, timeout, CORS, metrics)
//! - Serve on a listener until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::CacheStore;
use crate::config::ProxyConfig;
use crate::fetch::ResilientFetcher;
use crate::http::handlers;
use crate::http::request_id::{request_id_of, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::metrics;
use crate::security::cors_layer;
use crate::session::SessionManager;
use crate::upstream::{Endpoints, HttpTransport, Transport, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: ResilientFetcher,
    pub endpoints: Endpoints,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Transport(#[from] UpstreamError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// HTTP server for the market-data proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server talking to the real provider.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let transport = Arc::new(HttpTransport::new(&config.upstream)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a server over any transport.
    pub fn with_transport(config: ProxyConfig, transport: Arc<dyn Transport>) -> Self {
        let sessions = Arc::new(SessionManager::new(
            transport.clone(),
            &config.upstream,
            config.session.clone(),
        ));
        let fetcher = ResilientFetcher::new(
            transport,
            sessions,
            CacheStore::new(config.cache.ttl()),
            config.retries.clone(),
        );
        let state = AppState {
            fetcher,
            endpoints: Endpoints::new(&config.upstream.base_url),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/api/nifty50", get(handlers::nifty50))
            .route("/api/nifty", get(handlers::nifty))
            .route("/api/banknifty", get(handlers::bank_nifty))
            .route("/api/banknifty-stocks", get(handlers::bank_nifty_stocks))
            .route("/api/stock/{symbol}", get(handlers::stock_details))
            .route("/api/historical/{symbol}", get(handlers::historical))
            .route("/api/indices", get(handlers::indices))
            .with_state(state)
            .layer(middleware::from_fn(track_requests))
            .layer(cors_layer(&config.cors))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// A clone of the router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.observability.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Record latency per matched route.
async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let request_id = request_id_of(&request).to_owned();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    tracing::debug!(
        request_id = %request_id,
        route = %route,
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(&route, status, start);
    response
}
