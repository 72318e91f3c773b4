//! Households, families, and family composition.
//!
//! A household is a physical dwelling at an address with one owning resident.
//! A family is a social unit inside exactly one household; its display ID
//! encodes the occupancy relationship to the dwelling. Membership is recorded
//! as composition rows; a resident's "current family" is the composition with
//! the latest joined date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::NewAddress;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
  pub hh_id:         String,
  pub address_id:    Uuid,
  pub owner_rp_id:   String,
  pub staff_id:      Uuid,
  pub registered_at: DateTime<Utc>,
}

/// Input for standalone household creation (outside a registration bundle).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHousehold {
  pub address:     NewAddress,
  pub owner_rp_id: String,
}

// ─── Occupancy ───────────────────────────────────────────────────────────────

/// How the family occupies its household's dwelling. The code letter is the
/// trailing character of the family display ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyType {
  Owner,
  Renter,
  Sharer,
}

impl OccupancyType {
  pub fn code(self) -> char {
    match self {
      Self::Owner => 'O',
      Self::Renter => 'R',
      Self::Sharer => 'S',
    }
  }

  pub fn from_code(c: char) -> Option<Self> {
    match c {
      'O' => Some(Self::Owner),
      'R' => Some(Self::Renter),
      'S' => Some(Self::Sharer),
      _ => None,
    }
  }
}

// ─── Family ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
  pub fam_id:        String,
  pub hh_id:         String,
  pub occupancy:     OccupancyType,
  pub registered_at: DateTime<Utc>,
}

/// A member's role within a family unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyRole {
  Independent,
  Mother,
  Father,
  Dependent,
  Guardian,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyComposition {
  pub composition_id: Uuid,
  pub fam_id:         String,
  pub rp_id:          String,
  pub role:           FamilyRole,
  pub joined_at:      DateTime<Utc>,
}
