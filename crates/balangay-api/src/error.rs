//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use balangay_core::Error;
use serde_json::json;
use thiserror::Error as ThisError;

/// An error returned by an API handler.
#[derive(Debug, ThisError)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(String),
}

impl From<Error> for ApiError {
  fn from(e: Error) -> Self {
    match e {
      Error::PersonNotFound(_)
      | Error::StaffNotFound(_)
      | Error::SitioNotFound(_)
      | Error::ResidentNotFound(_)
      | Error::HouseholdNotFound(_)
      | Error::FamilyNotFound(_)
      | Error::BusinessNotFound(_)
      | Error::MedicineNotFound(_)
      | Error::RequestNotFound(_) => ApiError::NotFound(e.to_string()),

      Error::AlreadyProfiled { .. }
      | Error::UsernameTaken(_)
      | Error::DisplayIdConflict(_)
      | Error::InsufficientStock { .. } => ApiError::Conflict(e.to_string()),

      Error::HouseIndexOutOfRange { .. }
      | Error::InvalidHouseAddress(_)
      | Error::InvalidDisplayId(_) => ApiError::BadRequest(e.to_string()),

      Error::Serialization(_) | Error::Storage(_) | Error::External(_) => {
        ApiError::Store(e.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(m) => {
        tracing::error!("store failure: {m}");
        (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
