//! Handlers for `POST /registrations` and `POST /requests/:id/approve`.
//!
//! These are the two endpoints with side effects beyond the store: business
//! file uploads happen *before* the transaction (and are removed again if it
//! fails), and notification drafts returned by the store are dispatched
//! after commit, fire-and-forget.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use balangay_core::{
  business::NewBusinessFile,
  notify::{NotificationDraft, Notifier},
  registration::{
    JoinFamily, LivingSolo, NewAccount, NewHouse, PersonRef,
    RegistrationBusiness, RegistrationOutcome, RegistrationRequest,
  },
  storage::FileStorage,
  store::RegistryStore,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{RegistrationState, error::ApiError};

// ─── Body ─────────────────────────────────────────────────────────────────────

/// A business file carried inline as base64; uploaded before the store
/// transaction runs.
#[derive(Debug, Deserialize)]
pub struct FileUpload {
  pub name:       String,
  pub media_type: String,
  pub data:       String,
}

#[derive(Debug, Deserialize)]
pub struct BusinessBody {
  pub name:   String,
  pub nature: String,
  #[serde(default)]
  pub files:  Vec<FileUpload>,
}

/// JSON body accepted by `POST /registrations`.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub person:      PersonRef,
  pub account:     Option<NewAccount>,
  #[serde(default)]
  pub houses:      Vec<NewHouse>,
  pub living_solo: Option<LivingSolo>,
  pub join_family: Option<JoinFamily>,
  pub business:    Option<BusinessBody>,
  pub staff_id:    Uuid,
}

// ─── Register ─────────────────────────────────────────────────────────────────

/// `POST /registrations` — the cascading registration. Returns 201 + the
/// full [`RegistrationOutcome`].
pub async fn register<S, N, F>(
  State(state): State<RegistrationState<S, N, F>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + 'static,
  N: Notifier + 'static,
  F: FileStorage + 'static,
{
  // Uploads first; the transaction only sees stored locations.
  let mut uploaded: Vec<String> = Vec::new();
  let business = match body.business {
    Some(b) => {
      let mut files = Vec::with_capacity(b.files.len());
      for file in b.files {
        let bytes = B64.decode(&file.data).map_err(|_| {
          ApiError::BadRequest(format!("file {:?} is not valid base64", file.name))
        })?;
        let url = state
          .files
          .upload("business", &file.name, &file.media_type, bytes)
          .await?;
        uploaded.push(url.clone());
        files.push(NewBusinessFile {
          name:       file.name,
          media_type: file.media_type,
          url,
        });
      }
      Some(RegistrationBusiness { name: b.name, nature: b.nature, files })
    }
    None => None,
  };

  let request = RegistrationRequest {
    person:      body.person,
    account:     body.account,
    houses:      body.houses,
    living_solo: body.living_solo,
    join_family: body.join_family,
    business,
    staff_id:    body.staff_id,
  };

  match state.store.register(request).await {
    Ok(outcome) => {
      dispatch(Arc::clone(&state.notifier), outcome.notifications.clone());
      Ok((StatusCode::CREATED, Json(outcome)))
    }
    Err(e) => {
      // The transaction rolled back; remove what we uploaded for it.
      for url in uploaded {
        if let Err(remove_err) = state.files.remove(&url).await {
          tracing::warn!("failed to remove orphaned upload {url}: {remove_err}");
        }
      }
      Err(ApiError::from(e))
    }
  }
}

// ─── Approve ──────────────────────────────────────────────────────────────────

/// `POST /requests/:id/approve` — replay a staged registration.
pub async fn approve<S, N, F>(
  State(state): State<RegistrationState<S, N, F>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RegistrationOutcome>, ApiError>
where
  S: RegistryStore + 'static,
  N: Notifier + 'static,
  F: FileStorage + 'static,
{
  let outcome = state.store.approve_request(id).await?;
  dispatch(Arc::clone(&state.notifier), outcome.notifications.clone());
  Ok(Json(outcome))
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// Deliver drafts in the background. Delivery failures are logged and never
/// surface to the caller.
fn dispatch<N>(notifier: Arc<N>, drafts: Vec<NotificationDraft>)
where
  N: Notifier + 'static,
{
  tokio::spawn(async move {
    for draft in drafts {
      if let Err(e) = notifier.deliver(&draft).await {
        tracing::warn!("notification delivery failed: {e}");
      }
    }
  });
}
