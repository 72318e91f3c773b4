//! JSON REST API for the Balangay registry.
//!
//! Exposes axum [`Router`]s backed by any [`balangay_core::store::RegistryStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let api = balangay_api::api_router(store.clone())
//!   .merge(balangay_api::registration_router(reg_state));
//! let app = Router::new().nest("/api", api);
//! ```

pub mod businesses;
pub mod error;
pub mod families;
pub mod households;
pub mod medicines;
pub mod persons;
pub mod registrations;
pub mod requests;
pub mod residents;
pub mod sitios;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use balangay_core::{notify::Notifier, storage::FileStorage, store::RegistryStore};

pub use error::ApiError;

/// Build the resource router for `store` — everything except the two
/// endpoints that fan out notifications and touch object storage.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RegistryStore + 'static,
{
  Router::new()
    // Persons
    .route("/persons", get(persons::list::<S>).post(persons::create::<S>))
    .route("/persons/{id}", get(persons::get_one::<S>).patch(persons::update::<S>))
    .route("/persons/{id}/history", get(persons::history::<S>))
    .route("/persons/{id}/addresses", get(persons::addresses::<S>))
    // Residents
    .route("/residents", get(residents::list::<S>))
    .route("/residents/{rp_id}", get(residents::get_one::<S>))
    .route("/residents/{rp_id}/family", get(residents::family::<S>))
    // Sitios
    .route("/sitios", get(sitios::list::<S>).post(sitios::create::<S>))
    // Households
    .route("/households", get(households::list::<S>).post(households::create::<S>))
    .route("/households/{hh_id}", get(households::get_one::<S>))
    // Families
    .route("/families/{fam_id}", get(families::get_one::<S>))
    .route(
      "/families/{fam_id}/members",
      get(families::members::<S>).post(families::join::<S>),
    )
    // Businesses
    .route("/businesses", get(businesses::list::<S>).post(businesses::create::<S>))
    .route(
      "/businesses/{bus_id}",
      get(businesses::get_one::<S>).patch(businesses::update::<S>),
    )
    .route("/businesses/{bus_id}/history", get(businesses::history::<S>))
    .route("/businesses/{bus_id}/files", get(businesses::files::<S>))
    // Staged requests
    .route("/requests", get(requests::list::<S>).post(requests::submit::<S>))
    .route("/requests/{id}", delete(requests::delete_one::<S>))
    // Medicines
    .route("/medicines", get(medicines::list::<S>).post(medicines::create::<S>))
    .route("/medicines/{id}/dispense", post(medicines::dispense::<S>))
    .with_state(store)
}

// ─── Registration state ──────────────────────────────────────────────────────

/// State for the registration endpoints, which additionally upload business
/// files and dispatch post-commit notifications.
pub struct RegistrationState<S, N, F> {
  pub store:    Arc<S>,
  pub notifier: Arc<N>,
  pub files:    Arc<F>,
}

impl<S, N, F> Clone for RegistrationState<S, N, F> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: Arc::clone(&self.notifier),
      files:    Arc::clone(&self.files),
    }
  }
}

/// Build the router for the two registration endpoints.
pub fn registration_router<S, N, F>(state: RegistrationState<S, N, F>) -> Router<()>
where
  S: RegistryStore + 'static,
  N: Notifier + 'static,
  F: FileStorage + 'static,
{
  Router::new()
    .route("/registrations", post(registrations::register::<S, N, F>))
    .route(
      "/requests/{id}/approve",
      post(registrations::approve::<S, N, F>),
    )
    .with_state(state)
}
