//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use roster_core::validation::ValidationErrors;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler or the identity extractor.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthenticated")]
  Unauthorized,

  /// Rendered with an empty body so nothing about the record leaks.
  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<roster_core::Error> for ApiError {
  fn from(e: roster_core::Error) -> Self {
    match e {
      roster_core::Error::Validation(errors) => Self::Validation(errors),
      roster_core::Error::Forbidden(_) => Self::Forbidden,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthenticated" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"roster\""),
        );
        res
      }
      ApiError::Forbidden => StatusCode::FORBIDDEN.into_response(),
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Validation(errors) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
          "message": "The given data was invalid.",
          "errors":  errors,
        })),
      )
        .into_response(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store operation failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "internal server error" })),
        )
          .into_response()
      }
    }
  }
}
