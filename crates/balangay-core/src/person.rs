//! Person — the raw civil-registry subject.
//!
//! A person record holds identity data only. Registry standing (resident
//! profile, households, businesses) hangs off it through other entities.
//! Mutations never overwrite silently: each one appends a snapshot of the
//! prior state to the person's history ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::NewAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
  Male,
  Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CivilStatus {
  Single,
  Married,
  Widowed,
  Separated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
  pub person_id:    Uuid,
  pub first_name:   String,
  pub middle_name:  Option<String>,
  pub last_name:    String,
  pub suffix:       Option<String>,
  pub birth_date:   NaiveDate,
  pub sex:          Sex,
  pub civil_status: CivilStatus,
  pub contact_no:   Option<String>,
  pub email:        Option<String>,
  pub created_at:   DateTime<Utc>,
}

/// Input for creating a person. Addresses are deduplicated by the store
/// (get-or-create on the full field tuple) and linked to the new person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
  pub first_name:   String,
  pub middle_name:  Option<String>,
  pub last_name:    String,
  pub suffix:       Option<String>,
  pub birth_date:   NaiveDate,
  pub sex:          Sex,
  pub civil_status: CivilStatus,
  pub contact_no:   Option<String>,
  pub email:        Option<String>,
  #[serde(default)]
  pub addresses:    Vec<NewAddress>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonUpdate {
  pub first_name:   Option<String>,
  pub middle_name:  Option<String>,
  pub last_name:    Option<String>,
  pub suffix:       Option<String>,
  pub birth_date:   Option<NaiveDate>,
  pub sex:          Option<Sex>,
  pub civil_status: Option<CivilStatus>,
  pub contact_no:   Option<String>,
  pub email:        Option<String>,
}

impl PersonUpdate {
  pub fn is_empty(&self) -> bool {
    self.first_name.is_none()
      && self.middle_name.is_none()
      && self.last_name.is_none()
      && self.suffix.is_none()
      && self.birth_date.is_none()
      && self.sex.is_none()
      && self.civil_status.is_none()
      && self.contact_no.is_none()
      && self.email.is_none()
  }

  /// Produce the post-update person from the current row.
  pub fn apply(&self, current: &Person) -> Person {
    Person {
      person_id:    current.person_id,
      first_name:   self.first_name.clone().unwrap_or_else(|| current.first_name.clone()),
      middle_name:  self.middle_name.clone().or_else(|| current.middle_name.clone()),
      last_name:    self.last_name.clone().unwrap_or_else(|| current.last_name.clone()),
      suffix:       self.suffix.clone().or_else(|| current.suffix.clone()),
      birth_date:   self.birth_date.unwrap_or(current.birth_date),
      sex:          self.sex.unwrap_or(current.sex),
      civil_status: self.civil_status.unwrap_or(current.civil_status),
      contact_no:   self.contact_no.clone().or_else(|| current.contact_no.clone()),
      email:        self.email.clone().or_else(|| current.email.clone()),
      created_at:   current.created_at,
    }
  }
}
