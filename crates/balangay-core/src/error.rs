//! Error types for `balangay-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("staff not found: {0}")]
  StaffNotFound(Uuid),

  #[error("sitio not found: {0}")]
  SitioNotFound(Uuid),

  #[error("resident not found: {0}")]
  ResidentNotFound(String),

  #[error("household not found: {0}")]
  HouseholdNotFound(String),

  #[error("family not found: {0}")]
  FamilyNotFound(String),

  #[error("business not found: {0}")]
  BusinessNotFound(String),

  #[error("medicine not found: {0}")]
  MedicineNotFound(Uuid),

  #[error("registration request not found: {0}")]
  RequestNotFound(Uuid),

  #[error("person {person_id} already has resident profile {rp_id}")]
  AlreadyProfiled { person_id: Uuid, rp_id: String },

  #[error("username already taken: {0:?}")]
  UsernameTaken(String),

  /// A display ID collided at insert. Sequence numbers are claimed
  /// atomically, so this only happens if the counter table was reset by
  /// hand; the operation is safe to retry.
  #[error("display id already exists: {0}")]
  DisplayIdConflict(String),

  #[error("medicine {medicine_id}: {requested} requested but only {on_hand} on hand")]
  InsufficientStock {
    medicine_id: Uuid,
    on_hand:     i64,
    requested:   i64,
  },

  #[error("house index {index} out of range ({created} houses created)")]
  HouseIndexOutOfRange { index: usize, created: usize },

  #[error("cannot parse house location: {0:?}")]
  InvalidHouseAddress(String),

  #[error("malformed display id: {0:?}")]
  InvalidDisplayId(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Failure inside the storage backend (database, I/O).
  #[error("storage error: {0}")]
  Storage(String),

  /// Failure talking to an external collaborator (sync target, push
  /// gateway, object storage).
  #[error("external service error: {0}")]
  External(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
