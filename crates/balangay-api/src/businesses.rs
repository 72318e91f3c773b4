//! Handlers for `/businesses` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use balangay_core::{
  business::{Business, BusinessFile, BusinessUpdate, NewBusiness},
  history::BusinessHistory,
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /businesses`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Business>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.list_businesses().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub staff_id: Uuid,
  pub business: NewBusiness,
}

/// `POST /businesses` — standalone creation; file locations must already be
/// in object storage.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let business = store.create_business(body.business, body.staff_id).await?;
  Ok((StatusCode::CREATED, Json(business)))
}

/// `GET /businesses/:bus_id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(bus_id): Path<String>,
) -> Result<Json<Business>, ApiError>
where
  S: RegistryStore,
{
  let business = store
    .get_business(&bus_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("business {bus_id} not found")))?;
  Ok(Json(business))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub staff_id: Uuid,
  pub reason:   Option<String>,
  pub changes:  BusinessUpdate,
}

/// `PATCH /businesses/:bus_id` — snapshots the prior state before applying.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(bus_id): Path<String>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Business>, ApiError>
where
  S: RegistryStore,
{
  let business = store
    .update_business(&bus_id, body.changes, body.staff_id, body.reason)
    .await?;
  Ok(Json(business))
}

/// `GET /businesses/:bus_id/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  Path(bus_id): Path<String>,
) -> Result<Json<Vec<BusinessHistory>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.business_history(&bus_id).await?))
}

/// `GET /businesses/:bus_id/files`
pub async fn files<S>(
  State(store): State<Arc<S>>,
  Path(bus_id): Path<String>,
) -> Result<Json<Vec<BusinessFile>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.business_files(&bus_id).await?))
}
