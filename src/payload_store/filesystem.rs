//! Filesystem-based payload storage.
//!
//! Stores payloads as files in a directory structure:
//! ```text
//! {base_path}/
//!   {id[0:2]}/
//!     {id}.bin
//! ```
//!
//! The first two characters of the id create a subdirectory to avoid
//! having too many files in a single directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::{PayloadStore, PayloadStoreError, Result};

/// Filesystem-based payload store.
///
/// Ids are random 32-character hex handles, unrelated to the content.
pub struct FilesystemPayloadStore {
    base_path: PathBuf,
}

impl FilesystemPayloadStore {
    /// Create a new filesystem payload store.
    ///
    /// Creates the base directory if it doesn't exist.
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    /// Get the file path for a given id.
    ///
    /// Only non-empty alphanumeric ids are accepted, so an id can never
    /// name a path outside the base directory.
    fn path_for_id(&self, id: &str) -> Result<PathBuf> {
        if id.len() < 2 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PayloadStoreError::InvalidId(id.to_string()));
        }
        let subdir = &id[0..2];
        Ok(self.base_path.join(subdir).join(format!("{}.bin", id)))
    }
}

#[async_trait]
impl PayloadStore for FilesystemPayloadStore {
    async fn store(&self, bytes: &[u8]) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let path = self.path_for_id(&id)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(payload_id = %id, size = bytes.len(), "Stored payload bytes");
        Ok(id)
    }

    async fn retrieve(&self, id: &str) -> Result<Vec<u8>> {
        let path = self.path_for_id(id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PayloadStoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for_id(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(payload_id = %id, "Deleted payload bytes");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PayloadStoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
