//! Storage for payload bytes.
//!
//! The catalog only records metadata; the bytes live behind a
//! [`PayloadStore`]. A store hands out an opaque id when bytes are stored,
//! and that id is what the catalog records as the payload id.
//!
//! ## Storage Backends
//!
//! - `FilesystemPayloadStore` - Local filesystem storage

mod config;
mod filesystem;

pub use config::FileStoreConfig;
pub use filesystem::FilesystemPayloadStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during payload store operations.
#[derive(Debug, Error)]
pub enum PayloadStoreError {
    #[error("Invalid payload id: {0}")]
    InvalidId(String),

    #[error("Payload not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for payload store operations.
pub type Result<T> = std::result::Result<T, PayloadStoreError>;

/// Byte storage backend for payloads.
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Store bytes and return the id they can be retrieved by.
    async fn store(&self, bytes: &[u8]) -> Result<String>;

    /// Retrieve the bytes stored under `id`.
    async fn retrieve(&self, id: &str) -> Result<Vec<u8>>;

    /// Delete the bytes stored under `id`.
    async fn delete(&self, id: &str) -> Result<()>;

    /// URL prefix a client appends a payload id to in order to download it.
    fn update_url(&self, public_url: &str) -> String {
        format!("{}/file?id=", public_url.trim_end_matches('/'))
    }
}

/// Initialize the payload store based on configuration.
pub async fn init_payload_store(config: &FileStoreConfig) -> Result<Arc<dyn PayloadStore>> {
    info!(path = %config.path.display(), "PayloadStore: filesystem");
    let store = FilesystemPayloadStore::new(&config.path).await?;
    Ok(Arc::new(store))
}
