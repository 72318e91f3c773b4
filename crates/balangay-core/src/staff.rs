//! Barangay staff — the actors behind every registration and mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
  Admin,
  Staff,
}

/// Which desk a staff member works; drives notification fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assignment {
  Profiling,
  Clinic,
  Unassigned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
  pub staff_id:   Uuid,
  pub name:       String,
  pub role:       StaffRole,
  pub assignment: Assignment,
  /// Resident profile of the staff member, when they are themselves a
  /// registered resident. Notifications address this profile.
  pub rp_id:      Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
  pub name:       String,
  pub role:       StaffRole,
  pub assignment: Assignment,
  pub rp_id:      Option<String>,
}
