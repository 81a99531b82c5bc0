//! Route handlers.
//!
//! # Responsibilities
//! - Build the provider URL for each route
//! - Choose the fetch policy (cached by key, or uncached)
//! - Map the payload into the downstream shape
//! - Decide whether a failure degrades to an empty body or a 500

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::cache::CacheKey;
use crate::fetch::FetchError;
use crate::http::outcome::Outcome;
use crate::http::server::AppState;
use crate::market::models::{self, BankNiftyStock, Candle, IndicesOverview, StockRow};
use crate::market::status::market_status;
use crate::upstream::endpoints::{NIFTY_50, NIFTY_500, NIFTY_BANK};
use crate::upstream::UpstreamError;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "NSE proxy server is running" }))
}

/// Raw NIFTY 50 payload.
pub async fn nifty50(State(state): State<AppState>) -> Outcome<Value> {
    let url = state.endpoints.stock_indices(NIFTY_50);
    match state.fetcher.cached_fetch(&url, CacheKey::NIFTY_50).await {
        Ok(payload) => Outcome::Success(payload),
        Err(e) => Outcome::failure("Failed to fetch data from NSE", e),
    }
}

/// NIFTY 500 constituents; degrades to `[]`.
pub async fn nifty(State(state): State<AppState>) -> Outcome<Vec<StockRow>> {
    let url = state.endpoints.stock_indices(NIFTY_500);
    match state.fetcher.cached_fetch(&url, CacheKey::NIFTY_500).await {
        Ok(payload) => Outcome::Success(models::stock_rows(&payload)),
        Err(e) => Outcome::empty(e),
    }
}

/// NIFTY BANK constituents; degrades to `[]`.
pub async fn bank_nifty(State(state): State<AppState>) -> Outcome<Vec<StockRow>> {
    if let Err(e) = state.fetcher.sessions().acquire_headers().await {
        return Outcome::empty(e);
    }

    let url = state.endpoints.stock_indices(NIFTY_BANK);
    match state.fetcher.cached_fetch(&url, CacheKey::BANK_NIFTY).await {
        Ok(payload) => Outcome::Success(models::stock_rows(&payload)),
        Err(e) => Outcome::empty(e),
    }
}

pub async fn bank_nifty_stocks(State(state): State<AppState>) -> Outcome<Vec<BankNiftyStock>> {
    const FAILED: &str = "Failed to fetch Bank Nifty stocks";

    let url = state.endpoints.stock_indices(NIFTY_BANK);
    match state.fetcher.cached_fetch(&url, CacheKey::BANK_NIFTY).await {
        Ok(payload) => match models::bank_nifty_stocks(&payload) {
            Some(stocks) => Outcome::Success(stocks),
            None => Outcome::failure(FAILED, missing_data()),
        },
        Err(e) => Outcome::failure(FAILED, e),
    }
}

/// Quote merged with its trade-info section. Never cached.
pub async fn stock_details(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Outcome<Value> {
    const FAILED: &str = "Failed to fetch stock details";

    let quote = match state
        .fetcher
        .uncached_fetch(&state.endpoints.quote_equity(&symbol))
        .await
    {
        Ok(quote) => quote,
        Err(e) => return Outcome::failure(FAILED, e),
    };
    match state
        .fetcher
        .uncached_fetch(&state.endpoints.trade_info(&symbol))
        .await
    {
        Ok(trade_info) => Outcome::Success(models::stock_details(quote, trade_info)),
        Err(e) => Outcome::failure(FAILED, e),
    }
}

pub async fn historical(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Outcome<Vec<Candle>> {
    const FAILED: &str = "Failed to fetch historical data from NSE";

    match state
        .fetcher
        .uncached_fetch(&state.endpoints.historical(&symbol))
        .await
    {
        Ok(payload) => match models::candles(&payload) {
            Some(candles) => Outcome::Success(candles),
            None => Outcome::failure(FAILED, missing_data()),
        },
        Err(e) => Outcome::failure(FAILED, e),
    }
}

/// Headline rows of NIFTY 50 and NIFTY BANK with the market status.
///
/// Each index falls back to a zeroed snapshot on its own.
pub async fn indices(State(state): State<AppState>) -> Json<IndicesOverview> {
    let start = Instant::now();
    let market_status = market_status();

    if let Err(e) = state.fetcher.sessions().acquire_headers().await {
        tracing::warn!(error = %e, "Could not establish session before fetching indices");
    }

    let nifty_url = state.endpoints.stock_indices(NIFTY_50);
    let bank_url = state.endpoints.stock_indices(NIFTY_BANK);
    let (nifty50, bank_nifty) = tokio::join!(
        state.fetcher.cached_fetch(&nifty_url, CacheKey::NIFTY_50),
        state.fetcher.cached_fetch(&bank_url, CacheKey::BANK_NIFTY),
    );

    let nifty50 = log_index_error(NIFTY_50, nifty50);
    let bank_nifty = log_index_error(NIFTY_BANK, bank_nifty);

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        nifty_rows = row_count(nifty50.as_ref()),
        bank_nifty_rows = row_count(bank_nifty.as_ref()),
        market = ?market_status.status,
        "Indices fetched"
    );

    Json(IndicesOverview {
        market_status,
        nifty50: models::headline(nifty50.as_ref(), NIFTY_50),
        bank_nifty: models::headline(bank_nifty.as_ref(), NIFTY_BANK),
    })
}

fn log_index_error(index: &str, result: Result<Value, FetchError>) -> Option<Value> {
    result
        .map_err(|e| tracing::error!(index, error = %e, "Index fetch failed"))
        .ok()
}

fn row_count(payload: Option<&Value>) -> usize {
    payload
        .and_then(|p| p.get("data"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn missing_data() -> FetchError {
    FetchError::Upstream(UpstreamError::Decode("payload has no data array".into()))
}
