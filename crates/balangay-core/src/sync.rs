//! Outbox envelopes for the sibling-system mirror.
//!
//! Every create/update/delete of a mirrored entity writes one envelope in
//! the same transaction as the change itself. A delivery worker drains the
//! queue; local commits never wait on the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOp {
  Create,
  Update,
  Delete,
}

/// A queued mirror operation. `sync_id` orders delivery oldest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEnvelope {
  pub sync_id:    i64,
  pub op:         SyncOp,
  /// Entity kind tag, e.g. `"person"`, `"household"`.
  pub entity:     String,
  pub entity_id:  String,
  pub payload:    serde_json::Value,
  pub created_at: DateTime<Utc>,
  pub attempts:   i64,
  pub last_error: Option<String>,
}
