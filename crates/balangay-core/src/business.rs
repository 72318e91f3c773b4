//! Businesses and business respondents.
//!
//! A business is owned either by a registered resident or by an external
//! respondent (someone outside the barangay registry). Mutations append to
//! the business history ledger the same way person mutations do.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessStatus {
  Active,
  Inactive,
  Closed,
}

/// Who answers for the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusinessOwner {
  Resident { rp_id: String },
  External { br_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
  pub bus_id:        String,
  pub name:          String,
  pub nature:        String,
  pub status:        BusinessStatus,
  pub owner:         BusinessOwner,
  pub verified_on:   NaiveDate,
  pub staff_id:      Uuid,
  pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRespondent {
  pub br_id:      String,
  pub first_name: String,
  pub last_name:  String,
  pub contact_no: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRespondent {
  pub first_name: String,
  pub last_name:  String,
  pub contact_no: Option<String>,
}

/// Owner input for standalone business creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NewBusinessOwner {
  Resident { rp_id: String },
  External(NewRespondent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBusiness {
  pub name:   String,
  pub nature: String,
  pub owner:  NewBusinessOwner,
  #[serde(default)]
  pub files:  Vec<NewBusinessFile>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessUpdate {
  pub name:   Option<String>,
  pub nature: Option<String>,
  pub status: Option<BusinessStatus>,
}

impl BusinessUpdate {
  pub fn apply(&self, current: &Business) -> Business {
    Business {
      bus_id:        current.bus_id.clone(),
      name:          self.name.clone().unwrap_or_else(|| current.name.clone()),
      nature:        self.nature.clone().unwrap_or_else(|| current.nature.clone()),
      status:        self.status.unwrap_or(current.status),
      owner:         current.owner.clone(),
      verified_on:   current.verified_on,
      staff_id:      current.staff_id,
      registered_at: current.registered_at,
    }
  }
}

// ─── Files ───────────────────────────────────────────────────────────────────

/// An attachment stored outside the database; only the location is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessFile {
  pub file_id:    Uuid,
  pub bus_id:     String,
  pub name:       String,
  pub media_type: String,
  pub url:        String,
}

/// A file already handed to object storage, ready to attach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBusinessFile {
  pub name:       String,
  pub media_type: String,
  pub url:        String,
}
