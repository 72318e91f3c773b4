//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons` | All persons |
//! | `POST` | `/persons` | Body: [`CreateBody`]; returns 201 |
//! | `GET`  | `/persons/:id` | 404 if not found |
//! | `PATCH`| `/persons/:id` | Body: [`UpdateBody`]; appends a history row |
//! | `GET`  | `/persons/:id/history` | Ascending `history_id` |
//! | `GET`  | `/persons/:id/addresses` | Linked addresses |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use balangay_core::{
  address::Address,
  history::PersonHistory,
  person::{NewPerson, Person, PersonUpdate},
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /persons`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Person>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.list_persons().await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub staff_id: Uuid,
  pub person:   NewPerson,
}

/// `POST /persons` — returns 201 + the stored [`Person`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let person = store.create_person(body.person, body.staff_id).await?;
  Ok((StatusCode::CREATED, Json(person)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persons/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError>
where
  S: RegistryStore,
{
  let person = store
    .get_person(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub staff_id: Uuid,
  pub reason:   Option<String>,
  pub changes:  PersonUpdate,
}

/// `PATCH /persons/:id` — snapshots the prior state before applying.
/// An empty change set is rejected rather than burning a history version.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Person>, ApiError>
where
  S: RegistryStore,
{
  if body.changes.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".to_owned()));
  }
  let person = store
    .update_person(id, body.changes, body.staff_id, body.reason)
    .await?;
  Ok(Json(person))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /persons/:id/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PersonHistory>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.person_history(id).await?))
}

// ─── Addresses ────────────────────────────────────────────────────────────────

/// `GET /persons/:id/addresses`
pub async fn addresses<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Address>>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(store.person_addresses(id).await?))
}
