//! Append-only history ledgers.
//!
//! Tracked entities (person, business) never lose state on update: the prior
//! row is snapshotted into a history table before the change lands, keyed by
//! a per-parent version number that increases by one per mutation. History
//! rows are immutable once written and are deleted only by cascade when the
//! parent goes away.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{business::Business, person::Person};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonHistory {
  pub person_id:   Uuid,
  /// 1 for the first mutation, then strictly +1 per mutation.
  pub history_id:  i64,
  pub staff_id:    Uuid,
  pub reason:      Option<String>,
  /// Full state of the person before the mutation was applied.
  pub snapshot:    Person,
  pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHistory {
  pub bus_id:      String,
  pub history_id:  i64,
  pub staff_id:    Uuid,
  pub reason:      Option<String>,
  pub snapshot:    Business,
  pub recorded_at: DateTime<Utc>,
}

/// Records that an address was linked to a person while the person was at a
/// given history version. Joining on `(person_id, history_id)` answers
/// "which addresses did this person have as of version N".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressLink {
  pub person_id:   Uuid,
  pub address_id:  Uuid,
  /// The person's history version at the time the link was made.
  pub history_id:  i64,
  pub recorded_at: DateTime<Utc>,
}
