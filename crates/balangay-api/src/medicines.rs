//! Handlers for `/medicines` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use balangay_core::{
  medicine::{Dispense, DispenseRequest, Medicine, NewMedicine},
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /medicines`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Medicine>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.list_medicines().await?))
}

/// `POST /medicines`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewMedicine>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let medicine = store.create_medicine(body).await?;
  Ok((StatusCode::CREATED, Json(medicine)))
}

#[derive(Debug, Deserialize)]
pub struct DispenseBody {
  pub rp_id:    String,
  pub staff_id: Uuid,
  pub quantity: i64,
}

/// `POST /medicines/:id/dispense` — 409 on insufficient stock.
pub async fn dispense<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DispenseBody>,
) -> Result<Json<Dispense>, ApiError>
where
  S: RegistryStore,
{
  let dispense = store
    .dispense_medicine(DispenseRequest {
      medicine_id: id,
      rp_id:       body.rp_id,
      staff_id:    body.staff_id,
      quantity:    body.quantity,
    })
    .await?;
  Ok(Json(dispense))
}
