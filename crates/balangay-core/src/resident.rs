//! Resident profile — a person's standing as a civil-registry subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One per person, keyed by the human-readable `rp_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentProfile {
  pub rp_id:         String,
  pub person_id:     Uuid,
  /// Staff member who performed the registration.
  pub staff_id:      Uuid,
  pub voter:         bool,
  pub registered_at: DateTime<Utc>,
}
