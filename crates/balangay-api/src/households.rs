//! Handlers for `/households` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use balangay_core::{
  household::{Household, NewHousehold},
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /households`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Household>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.list_households().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub staff_id:  Uuid,
  pub household: NewHousehold,
}

/// `POST /households` — returns 201 + the stored [`Household`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let household = store.create_household(body.household, body.staff_id).await?;
  Ok((StatusCode::CREATED, Json(household)))
}

/// `GET /households/:hh_id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(hh_id): Path<String>,
) -> Result<Json<Household>, ApiError>
where
  S: RegistryStore,
{
  let household = store
    .get_household(&hh_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("household {hh_id} not found")))?;
  Ok(Json(household))
}
