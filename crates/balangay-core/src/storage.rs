//! Object-storage capability.
//!
//! File bytes never enter the database; uploads happen before the owning
//! transaction and the stored location is linked afterwards. On transaction
//! failure the caller removes what it uploaded.

use std::future::Future;

use crate::Result;

pub trait FileStorage: Send + Sync {
  /// Store `bytes` under `folder` and return the public location.
  fn upload(
    &self,
    folder: &str,
    name: &str,
    media_type: &str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<String>> + Send;

  /// Remove a previously uploaded file by its returned location.
  fn remove(&self, url: &str) -> impl Future<Output = Result<()>> + Send;
}
