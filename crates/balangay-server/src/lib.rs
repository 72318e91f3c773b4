//! Server assembly for the Balangay registry.
//!
//! Owns runtime configuration, the router stack, and the background workers
//! (expiry sweep, outbox delivery). The binary in `main.rs` wires these
//! together from `config.toml`.

pub mod notify;
pub mod outbox;
pub mod storage;
pub mod sweep;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use balangay_api::RegistrationState;
use balangay_core::{notify::Notifier, storage::FileStorage, store::RegistryStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_sweep_interval_minutes() -> u64 { 15 }
fn default_request_ttl_days() -> i64 { 30 }
fn default_sync_interval_seconds() -> u64 { 30 }

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `BALANGAY_`-prefixed environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Root directory for uploaded files.
  pub files_dir:  PathBuf,

  /// Base URL of the sibling system mirrored through the outbox. Unset
  /// disables the delivery worker (envelopes still accumulate).
  #[serde(default)]
  pub sync_base_url: Option<String>,
  /// Push-gateway endpoint for notifications. Unset logs and drops drafts.
  #[serde(default)]
  pub notify_url:    Option<String>,

  #[serde(default = "default_sweep_interval_minutes")]
  pub sweep_interval_minutes: u64,
  #[serde(default = "default_request_ttl_days")]
  pub request_ttl_days:       i64,
  #[serde(default = "default_sync_interval_seconds")]
  pub sync_interval_seconds:  u64,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router over the given collaborators.
pub fn app<S, N, F>(store: Arc<S>, notifier: Arc<N>, files: Arc<F>) -> Router
where
  S: RegistryStore + 'static,
  N: Notifier + 'static,
  F: FileStorage + 'static,
{
  let api = balangay_api::api_router(Arc::clone(&store)).merge(
    balangay_api::registration_router(RegistrationState { store, notifier, files }),
  );
  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use balangay_core::{
    staff::{Assignment, NewStaff, StaffRole},
    store::RegistryStore,
  };
  use balangay_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use crate::{notify::PushGateway, storage::DiskStorage};

  async fn make_app() -> (Router, Arc<SqliteStore>, Uuid) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let staff = store
      .create_staff(NewStaff {
        name:       "Ana Reyes".into(),
        role:       StaffRole::Admin,
        assignment: Assignment::Profiling,
        rp_id:      None,
      })
      .await
      .unwrap();
    let files = DiskStorage::new(
      std::env::temp_dir().join(format!("balangay-test-{}", Uuid::new_v4())),
    );
    let app = app(
      Arc::clone(&store),
      Arc::new(PushGateway::new(None)),
      Arc::new(files),
    );
    (app, store, staff.staff_id)
  }

  async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
  ) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      serde_json::Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      serde_json::Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn registration_body(staff_id: Uuid) -> serde_json::Value {
    serde_json::json!({
      "person": {
        "kind": "new",
        "first_name": "Maria",
        "middle_name": null,
        "last_name": "Santos",
        "suffix": null,
        "birth_date": "1991-02-11",
        "sex": "female",
        "civil_status": "single",
        "contact_no": "09171234567",
        "email": null,
        "addresses": []
      },
      "houses": [{ "location": "Mahogany - Purok 3" }],
      "living_solo": {
        "household": { "kind": "created", "index": 0 },
        "occupancy": "owner"
      },
      "staff_id": staff_id,
    })
  }

  #[tokio::test]
  async fn registration_round_trip() {
    let (app, _store, staff) = make_app().await;

    let (status, body) = send_json(
      app.clone(),
      "POST",
      "/api/registrations",
      registration_body(staff),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");

    let rp_id = body["resident"]["rp_id"].as_str().unwrap().to_owned();
    let fam_id = body["family"]["fam_id"].as_str().unwrap().to_owned();
    assert!(fam_id.ends_with("-O"));

    let (status, resident) = get(app.clone(), &format!("/api/residents/{rp_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resident["rp_id"].as_str(), Some(rp_id.as_str()));

    let (status, family) =
      get(app, &format!("/api/residents/{rp_id}/family")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(family["fam_id"].as_str(), Some(fam_id.as_str()));
  }

  #[tokio::test]
  async fn unknown_resident_is_404() {
    let (app, _store, _staff) = make_app().await;
    let (status, _) = get(app, "/api/residents/26010100042").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn failed_registration_writes_nothing() {
    let (app, _store, staff) = make_app().await;

    let mut body = registration_body(staff);
    body["living_solo"] = serde_json::Value::Null;
    body["join_family"] =
      serde_json::json!({ "fam_id": "9901010001-O", "role": "father" });

    let (status, error) =
      send_json(app.clone(), "POST", "/api/registrations", body).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "body: {error}");

    let (status, persons) = get(app, "/api/persons").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(persons.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn registration_uploads_business_files() {
    let (app, store, staff) = make_app().await;

    let mut body = registration_body(staff);
    body["business"] = serde_json::json!({
      "name": "Santos Sari-sari",
      "nature": "Retail",
      "files": [{
        "name": "permit.pdf",
        "media_type": "application/pdf",
        "data": "aGVsbG8=",
      }],
    });

    let (status, outcome) =
      send_json(app.clone(), "POST", "/api/registrations", body).await;
    assert_eq!(status, StatusCode::CREATED, "body: {outcome}");
    let bus_id = outcome["business"]["bus_id"].as_str().unwrap();

    let files = store.business_files(bus_id).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "permit.pdf");
    assert!(files[0].url.starts_with("business/"));
  }

  #[tokio::test]
  async fn dispensing_past_stock_is_a_conflict() {
    let (app, store, staff) = make_app().await;

    let (_, outcome) = send_json(
      app.clone(),
      "POST",
      "/api/registrations",
      registration_body(staff),
    )
    .await;
    let rp_id = outcome["resident"]["rp_id"].as_str().unwrap().to_owned();

    let medicine = store
      .create_medicine(balangay_core::medicine::NewMedicine {
        name:     "Paracetamol".into(),
        unit:     "tablet".into(),
        quantity: 3,
      })
      .await
      .unwrap();

    let (status, _) = send_json(
      app,
      "POST",
      &format!("/api/medicines/{}/dispense", medicine.medicine_id),
      serde_json::json!({ "rp_id": rp_id, "staff_id": staff, "quantity": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }
}
