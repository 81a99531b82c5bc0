//! Unified handler result.
//!
//! Each handler decides what a failure becomes for its route: a degraded
//! empty body (`Empty`) or a 500 with a fixed message (`Failure`). The
//! response never carries internal error details.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::fetch::FetchError;

#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// Served as `T::default()` with status 200.
    Empty { reason: String },
    /// Served as 500 `{"error": message}`.
    Failure {
        message: &'static str,
        cause: FetchError,
    },
}

impl<T> Outcome<T> {
    pub fn empty(cause: impl std::fmt::Display) -> Self {
        Outcome::Empty {
            reason: cause.to_string(),
        }
    }

    pub fn failure(message: &'static str, cause: FetchError) -> Self {
        Outcome::Failure { message, cause }
    }
}

impl<T> IntoResponse for Outcome<T>
where
    T: Serialize + Default,
{
    fn into_response(self) -> Response {
        match self {
            Outcome::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            Outcome::Empty { reason } => {
                tracing::warn!(reason = %reason, "Serving empty response");
                (StatusCode::OK, Json(T::default())).into_response()
            }
            Outcome::Failure { message, cause } => {
                tracing::error!(error = %cause, "{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}
