//! Payload store configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Filesystem payload store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Directory payload files are kept under.
    pub path: PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./storage"),
        }
    }
}
