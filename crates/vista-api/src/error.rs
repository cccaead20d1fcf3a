//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Every failure is a store failure from the client's point of view: the
/// request either yields a complete result set or a single error.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("malformed aggregation result: {0}")]
  Aggregation(#[from] vista_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = match &self {
      ApiError::Store(e) => e.to_string(),
      ApiError::Aggregation(e) => e.to_string(),
    };
    tracing::error!(error = %message, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
  }
}
