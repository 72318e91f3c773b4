//! Clinic medicine stock and dispensing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
  pub medicine_id: Uuid,
  pub name:        String,
  /// Dispensing unit, e.g. "tablet", "bottle".
  pub unit:        String,
  pub quantity:    i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicine {
  pub name:     String,
  pub unit:     String,
  pub quantity: i64,
}

/// A completed hand-out of stock to a resident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispense {
  pub dispense_id:  Uuid,
  pub medicine_id:  Uuid,
  pub rp_id:        String,
  pub staff_id:     Uuid,
  pub quantity:     i64,
  pub dispensed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispenseRequest {
  pub medicine_id: Uuid,
  pub rp_id:       String,
  pub staff_id:    Uuid,
  pub quantity:    i64,
}
