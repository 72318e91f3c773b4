//! Addresses and sitios.
//!
//! A sitio is a named sub-locality within the barangay. An address can point
//! at a registered sitio or carry a free-text fallback for locations outside
//! the barangay's sitio list.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sitio {
  pub sitio_id: Uuid,
  pub name:     String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSitio {
  pub name: String,
}

/// A deduplicated address row. Two addresses with the same full field tuple
/// are the same row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
  pub address_id:     Uuid,
  pub province:       String,
  pub city:           String,
  pub barangay:       String,
  pub street:         String,
  pub sitio_id:       Option<Uuid>,
  pub external_sitio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
  pub province:       String,
  pub city:           String,
  pub barangay:       String,
  pub street:         String,
  pub sitio_id:       Option<Uuid>,
  pub external_sitio: Option<String>,
}
