//! The `RegistryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `balangay-store-sqlite`). Higher layers (`balangay-api`,
//! `balangay-server`) depend on this abstraction, not on any concrete
//! backend. All methods return the crate-level [`Error`](crate::Error) so
//! callers can map domain failures to protocol responses without knowing the
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Result,
  address::{Address, NewSitio, Sitio},
  business::{
    Business, BusinessFile, BusinessUpdate, NewBusiness,
  },
  history::{AddressLink, BusinessHistory, PersonHistory},
  household::{Family, FamilyComposition, FamilyRole, Household, NewHousehold},
  medicine::{Dispense, DispenseRequest, Medicine, NewMedicine},
  person::{NewPerson, Person, PersonUpdate},
  registration::{
    NewRequest, RegistrationOutcome, RegistrationRequest, RequestRegistration,
  },
  resident::ResidentProfile,
  staff::{NewStaff, Staff},
  sync::SyncEnvelope,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RegistryStore::search_residents`].
#[derive(Debug, Clone, Default)]
pub struct ResidentQuery {
  /// Free-text filter over the linked person's name parts.
  pub text:     Option<String>,
  /// Restrict to residents with an address in this sitio.
  pub sitio_id: Option<Uuid>,
  pub voter:    Option<bool>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Balangay registry backend.
///
/// Multi-entity writes ([`register`](Self::register), updates with history
/// capture, dispensing) are atomic: either every row lands or none does.
/// History writes are append-only. All methods return `Send` futures so the
/// trait can be used in multi-threaded async runtimes.
pub trait RegistryStore: Send + Sync {
  // ── Persons ───────────────────────────────────────────────────────────

  /// Create a person, deduplicating and linking any supplied addresses.
  fn create_person(
    &self,
    input: NewPerson,
    staff_id: Uuid,
  ) -> impl Future<Output = Result<Person>> + Send + '_;

  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>>> + Send + '_;

  fn list_persons(&self) -> impl Future<Output = Result<Vec<Person>>> + Send + '_;

  /// Apply a partial update, snapshotting the prior state into the history
  /// ledger with the next version number.
  fn update_person(
    &self,
    id: Uuid,
    changes: PersonUpdate,
    staff_id: Uuid,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Person>> + Send + '_;

  /// History rows for a person, ordered by ascending `history_id`.
  fn person_history(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<PersonHistory>>> + Send + '_;

  fn person_addresses(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Address>>> + Send + '_;

  /// Address links recorded at or before the given history version.
  fn address_links_at(
    &self,
    id: Uuid,
    history_id: i64,
  ) -> impl Future<Output = Result<Vec<AddressLink>>> + Send + '_;

  // ── Sitios ────────────────────────────────────────────────────────────

  fn create_sitio(
    &self,
    input: NewSitio,
  ) -> impl Future<Output = Result<Sitio>> + Send + '_;

  fn list_sitios(&self) -> impl Future<Output = Result<Vec<Sitio>>> + Send + '_;

  // ── Staff ─────────────────────────────────────────────────────────────

  fn create_staff(
    &self,
    input: NewStaff,
  ) -> impl Future<Output = Result<Staff>> + Send + '_;

  fn get_staff(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Staff>>> + Send + '_;

  // ── Registration ──────────────────────────────────────────────────────

  /// Run the cascading registration transaction (person → profile →
  /// account → households → family → business) atomically and return
  /// everything created plus the notification drafts to dispatch.
  fn register(
    &self,
    request: RegistrationRequest,
  ) -> impl Future<Output = Result<RegistrationOutcome>> + Send + '_;

  // ── Residents ─────────────────────────────────────────────────────────

  fn get_resident<'a>(
    &'a self,
    rp_id: &'a str,
  ) -> impl Future<Output = Result<Option<ResidentProfile>>> + Send + 'a;

  /// LIKE-based search over person name parts with optional filters.
  fn search_residents<'a>(
    &'a self,
    query: &'a ResidentQuery,
  ) -> impl Future<Output = Result<Vec<ResidentProfile>>> + Send + 'a;

  /// The family of the resident's most recent composition, if any.
  fn current_family<'a>(
    &'a self,
    rp_id: &'a str,
  ) -> impl Future<Output = Result<Option<Family>>> + Send + 'a;

  // ── Households ────────────────────────────────────────────────────────

  fn create_household(
    &self,
    input: NewHousehold,
    staff_id: Uuid,
  ) -> impl Future<Output = Result<Household>> + Send + '_;

  fn get_household<'a>(
    &'a self,
    hh_id: &'a str,
  ) -> impl Future<Output = Result<Option<Household>>> + Send + 'a;

  fn list_households(
    &self,
  ) -> impl Future<Output = Result<Vec<Household>>> + Send + '_;

  // ── Families ──────────────────────────────────────────────────────────

  fn get_family<'a>(
    &'a self,
    fam_id: &'a str,
  ) -> impl Future<Output = Result<Option<Family>>> + Send + 'a;

  fn family_members<'a>(
    &'a self,
    fam_id: &'a str,
  ) -> impl Future<Output = Result<Vec<FamilyComposition>>> + Send + 'a;

  /// Add a resident to an existing family with the given role.
  fn join_family<'a>(
    &'a self,
    fam_id: &'a str,
    rp_id: &'a str,
    role: FamilyRole,
  ) -> impl Future<Output = Result<FamilyComposition>> + Send + 'a;

  // ── Businesses ────────────────────────────────────────────────────────

  fn create_business(
    &self,
    input: NewBusiness,
    staff_id: Uuid,
  ) -> impl Future<Output = Result<Business>> + Send + '_;

  fn get_business<'a>(
    &'a self,
    bus_id: &'a str,
  ) -> impl Future<Output = Result<Option<Business>>> + Send + 'a;

  fn list_businesses(
    &self,
  ) -> impl Future<Output = Result<Vec<Business>>> + Send + '_;

  fn update_business<'a>(
    &'a self,
    bus_id: &'a str,
    changes: BusinessUpdate,
    staff_id: Uuid,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Business>> + Send + 'a;

  fn business_history<'a>(
    &'a self,
    bus_id: &'a str,
  ) -> impl Future<Output = Result<Vec<BusinessHistory>>> + Send + 'a;

  fn business_files<'a>(
    &'a self,
    bus_id: &'a str,
  ) -> impl Future<Output = Result<Vec<BusinessFile>>> + Send + 'a;

  // ── Staged requests ───────────────────────────────────────────────────

  fn submit_request(
    &self,
    input: NewRequest,
  ) -> impl Future<Output = Result<RequestRegistration>> + Send + '_;

  fn list_requests(
    &self,
  ) -> impl Future<Output = Result<Vec<RequestRegistration>>> + Send + '_;

  /// Replay the staged payload through [`register`](Self::register) and
  /// delete the staging rows on success.
  fn approve_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<RegistrationOutcome>> + Send + '_;

  fn delete_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Delete staged requests created at or before `cutoff`; returns how many
  /// were removed.
  fn sweep_expired_requests(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64>> + Send + '_;

  // ── Medicines ─────────────────────────────────────────────────────────

  fn create_medicine(
    &self,
    input: NewMedicine,
  ) -> impl Future<Output = Result<Medicine>> + Send + '_;

  fn list_medicines(
    &self,
  ) -> impl Future<Output = Result<Vec<Medicine>>> + Send + '_;

  /// Decrement stock and record the hand-out, atomically. Insufficient
  /// stock fails the whole operation.
  fn dispense_medicine(
    &self,
    request: DispenseRequest,
  ) -> impl Future<Output = Result<Dispense>> + Send + '_;

  // ── Outbox ────────────────────────────────────────────────────────────

  /// Undelivered sync envelopes, oldest first.
  fn pending_sync(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<SyncEnvelope>>> + Send + '_;

  fn mark_delivered(
    &self,
    sync_id: i64,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  fn record_sync_failure<'a>(
    &'a self,
    sync_id: i64,
    error: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}
