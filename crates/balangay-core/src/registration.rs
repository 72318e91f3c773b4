//! Registration bundles — the one multi-entity write path in the registry.
//!
//! A single inbound payload can create a person, their resident profile, an
//! account, households, a family (or membership in an existing one), and a
//! business, all inside one store transaction. Staged requests hold the same
//! payload while awaiting approval and expire after thirty days.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  business::{Business, NewBusinessFile},
  household::{Family, FamilyComposition, FamilyRole, Household, OccupancyType},
  notify::NotificationDraft,
  person::{NewPerson, Person},
  resident::ResidentProfile,
};

/// Home-barangay address constants applied to every registered house.
pub const HOME_PROVINCE: &str = "Cebu";
pub const HOME_CITY: &str = "Balamban";
pub const HOME_BARANGAY: &str = "Buanoy";

// ─── Payload ─────────────────────────────────────────────────────────────────

/// Either an already-registered person or a full new-person payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersonRef {
  Existing { person_id: Uuid },
  New(NewPerson),
}

/// Login account created alongside the resident profile. The hash is opaque
/// to the registry; credential verification lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
  pub username:    String,
  pub secret_hash: String,
}

/// One house to register. The location string is `"<sitio> - <street>"`;
/// province, city, and barangay are fixed to the home constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHouse {
  pub location: String,
}

impl NewHouse {
  /// Split the dash-delimited location into `(sitio, street)`.
  pub fn parse_location(&self) -> crate::Result<(String, String)> {
    let (sitio, street) = self
      .location
      .split_once('-')
      .ok_or_else(|| crate::Error::InvalidHouseAddress(self.location.clone()))?;
    let sitio = sitio.trim();
    let street = street.trim();
    if sitio.is_empty() || street.is_empty() {
      return Err(crate::Error::InvalidHouseAddress(self.location.clone()));
    }
    Ok((sitio.to_owned(), street.to_owned()))
  }
}

/// Which household a living-solo family is attached to: one created earlier
/// in the same bundle (by position) or one that already exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HouseholdRef {
  Created { index: usize },
  Existing { hh_id: String },
}

/// The new resident forms a one-person family of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivingSolo {
  pub household: HouseholdRef,
  pub occupancy: OccupancyType,
}

/// The new resident joins an existing family with the given role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinFamily {
  pub fam_id: String,
  pub role:   FamilyRole,
}

/// Business created as part of the bundle, owned by the new resident.
/// Files must already be in object storage; only their locations are linked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationBusiness {
  pub name:   String,
  pub nature: String,
  #[serde(default)]
  pub files:  Vec<NewBusinessFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
  pub person:      PersonRef,
  pub account:     Option<NewAccount>,
  #[serde(default)]
  pub houses:      Vec<NewHouse>,
  pub living_solo: Option<LivingSolo>,
  pub join_family: Option<JoinFamily>,
  pub business:    Option<RegistrationBusiness>,
  /// Staff member performing the registration.
  pub staff_id:    Uuid,
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Everything the transaction created, plus the notification drafts the
/// caller should dispatch after commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
  pub person:        Person,
  pub resident:      ResidentProfile,
  pub households:    Vec<Household>,
  pub family:        Option<Family>,
  pub composition:   Option<FamilyComposition>,
  pub business:      Option<Business>,
  pub notifications: Vec<NotificationDraft>,
}

// ─── Staged requests ─────────────────────────────────────────────────────────

/// Proposed member of the staged family, recorded alongside the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestComposition {
  pub rp_id: String,
  pub role:  FamilyRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequest {
  pub payload:      RegistrationRequest,
  #[serde(default)]
  pub compositions: Vec<RequestComposition>,
}

/// A pending registration awaiting approval. Swept thirty days after
/// creation if never approved or rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRegistration {
  pub request_id:   Uuid,
  pub payload:      RegistrationRequest,
  pub compositions: Vec<RequestComposition>,
  pub created_at:   DateTime<Utc>,
}
