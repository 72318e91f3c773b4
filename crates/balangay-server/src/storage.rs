//! Disk-backed object storage.
//!
//! Files live under a configured root directory; the store only ever sees
//! the relative location this module returns.

use std::path::PathBuf;

use balangay_core::{Error, Result, storage::FileStorage};
use uuid::Uuid;

#[derive(Clone)]
pub struct DiskStorage {
  root: PathBuf,
}

impl DiskStorage {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }
}

impl FileStorage for DiskStorage {
  async fn upload(
    &self,
    folder: &str,
    name: &str,
    _media_type: &str,
    bytes: Vec<u8>,
  ) -> Result<String> {
    let safe_name = name.replace(['/', '\\'], "_");
    let location = format!("{folder}/{}-{safe_name}", Uuid::new_v4());
    let path = self.root.join(&location);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| Error::External(format!("create {parent:?}: {e}")))?;
    }
    tokio::fs::write(&path, &bytes)
      .await
      .map_err(|e| Error::External(format!("write {path:?}: {e}")))?;
    Ok(location)
  }

  async fn remove(&self, url: &str) -> Result<()> {
    // Only locations we produced are accepted.
    if url.contains("..") {
      return Err(Error::External(format!("refusing path {url:?}")));
    }
    tokio::fs::remove_file(self.root.join(url))
      .await
      .map_err(|e| Error::External(format!("remove {url:?}: {e}")))
  }
}
