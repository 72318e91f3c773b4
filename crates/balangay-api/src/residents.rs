//! Handlers for `/residents` endpoints.
//!
//! Query params on the list endpoint map directly to
//! [`ResidentQuery`](balangay_core::store::ResidentQuery) fields.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use balangay_core::{
  household::Family,
  resident::ResidentProfile,
  store::{RegistryStore, ResidentQuery},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Free-text filter over the person's name parts.
  pub text:     Option<String>,
  pub sitio_id: Option<Uuid>,
  pub voter:    Option<bool>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// `GET /residents[?text=...][&sitio_id=...][&voter=...][&limit=...][&offset=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ResidentProfile>>, ApiError>
where
  S: RegistryStore,
{
  let query = ResidentQuery {
    text:     params.text,
    sitio_id: params.sitio_id,
    voter:    params.voter,
    limit:    params.limit,
    offset:   params.offset,
  };
  Ok(Json(store.search_residents(&query).await?))
}

/// `GET /residents/:rp_id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(rp_id): Path<String>,
) -> Result<Json<ResidentProfile>, ApiError>
where
  S: RegistryStore,
{
  let resident = store
    .get_resident(&rp_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("resident {rp_id} not found")))?;
  Ok(Json(resident))
}

/// `GET /residents/:rp_id/family` — the family of the most recent
/// composition. 404 when the resident has never joined one.
pub async fn family<S>(
  State(store): State<Arc<S>>,
  Path(rp_id): Path<String>,
) -> Result<Json<Family>, ApiError>
where
  S: RegistryStore,
{
  let family = store
    .current_family(&rp_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("resident {rp_id} has no family")))?;
  Ok(Json(family))
}
