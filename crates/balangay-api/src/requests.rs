//! Handlers for `/requests` endpoints (staged registrations).

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use balangay_core::{
  registration::{NewRequest, RequestRegistration},
  store::RegistryStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /requests`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<RequestRegistration>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.list_requests().await?))
}

/// `POST /requests` — stage a registration for later approval.
pub async fn submit<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let request = store.submit_request(body).await?;
  Ok((StatusCode::CREATED, Json(request)))
}

/// `DELETE /requests/:id` — reject a staged registration.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  store.delete_request(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
