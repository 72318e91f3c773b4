//! Notification drafts and the delivery capability.
//!
//! The store computes *who* should hear about a structural change and *what*
//! to tell them; actual push delivery is behind the [`Notifier`] trait and is
//! always fire-and-forget. A failed delivery is logged, never propagated into
//! the write path.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
  Registration,
  Household,
  Family,
  Business,
}

/// A deep link into one of the client apps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
  pub name:   String,
  pub params: serde_json::Value,
}

impl Route {
  pub fn new(name: impl Into<String>, params: serde_json::Value) -> Self {
    Self { name: name.into(), params }
  }
}

/// A notification ready for delivery: recipients are resident profile IDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDraft {
  pub title:      String,
  pub message:    String,
  pub recipients: Vec<String>,
  pub kind:       NotificationKind,
  pub web:        Route,
  pub mobile:     Route,
}

/// Delivery capability implemented by the server layer.
pub trait Notifier: Send + Sync {
  fn deliver(
    &self,
    draft: &NotificationDraft,
  ) -> impl Future<Output = Result<()>> + Send;
}
