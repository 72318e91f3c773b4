//! Handlers for `/sitios` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use balangay_core::{
  address::{NewSitio, Sitio},
  store::RegistryStore,
};

use crate::error::ApiError;

/// `GET /sitios`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Sitio>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.list_sitios().await?))
}

/// `POST /sitios` — get-or-create by name.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewSitio>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let sitio = store.create_sitio(body).await?;
  Ok((StatusCode::CREATED, Json(sitio)))
}
