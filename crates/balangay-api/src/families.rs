//! Handlers for `/families` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use balangay_core::{
  household::{Family, FamilyComposition, FamilyRole},
  store::RegistryStore,
};
use serde::Deserialize;

use crate::error::ApiError;

/// `GET /families/:fam_id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(fam_id): Path<String>,
) -> Result<Json<Family>, ApiError>
where
  S: RegistryStore,
{
  let family = store
    .get_family(&fam_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("family {fam_id} not found")))?;
  Ok(Json(family))
}

/// `GET /families/:fam_id/members`
pub async fn members<S>(
  State(store): State<Arc<S>>,
  Path(fam_id): Path<String>,
) -> Result<Json<Vec<FamilyComposition>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.family_members(&fam_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
  pub rp_id: String,
  pub role:  FamilyRole,
}

/// `POST /families/:fam_id/members` — add an existing resident.
pub async fn join<S>(
  State(store): State<Arc<S>>,
  Path(fam_id): Path<String>,
  Json(body): Json<JoinBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let composition = store.join_family(&fam_id, &body.rp_id, body.role).await?;
  Ok((StatusCode::CREATED, Json(composition)))
}
