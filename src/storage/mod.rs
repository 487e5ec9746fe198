//! Storage for the payload catalog, channel policy and event log.
//!
//! The three stores are separate traits so the resolution engine and the
//! admin tooling only see what they use. Both backends implement all three
//! on a single object: every operation goes through one lock around one
//! backing store, and a [`Storage`] bundle hands out the three views.
//!
//! Backends:
//! - `SqliteStore` (feature: sqlite) - single SQLite connection behind a mutex
//! - `MemoryStore` - in-memory, with failure injection for tests

mod config;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use config::{StorageConfig, StorageType};
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use crate::event::Event;
use crate::payload::Payload;

/// Errors raised by a storage backend.
///
/// These are always handed back to the caller unchanged. Nothing in this
/// crate retries a failed storage operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Payload size {0} exceeds the storable range")]
    SizeOutOfRange(u64),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage type '{0}' is not enabled in this build")]
    BackendNotEnabled(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable record of payloads and their channel associations.
///
/// Every mutating operation is atomic: it either applies completely or
/// leaves the catalog unchanged. Sequences of calls are not atomic as a
/// group; use [`PayloadCatalog::publish_payload`] when a payload must never
/// exist without its channel.
#[async_trait]
pub trait PayloadCatalog: Send + Sync {
    /// Insert a payload row.
    ///
    /// Ids are not checked for uniqueness; callers generate
    /// collision-resistant handles.
    async fn add_payload(&self, payload: &Payload) -> Result<()>;

    /// Whether at least one payload row carries `id`.
    async fn payload_exists(&self, id: &str) -> Result<bool>;

    /// Associate a payload with a channel. Re-attaching is a no-op.
    async fn attach_to_channel(&self, id: &str, channel: &str) -> Result<()>;

    /// Insert a payload and attach it to `channel` in one transaction.
    async fn publish_payload(&self, payload: &Payload, channel: &str) -> Result<()>;

    /// Remove the payload rows for `id` and all of their channel
    /// associations. Channel policy is left untouched. Unknown ids are a
    /// no-op.
    async fn delete_payload(&self, id: &str) -> Result<()>;

    /// Distinct channel names with at least one payload attached, sorted.
    async fn list_channels(&self) -> Result<Vec<String>>;

    /// Payloads attached to `channel`, ascending by version.
    async fn list_images(&self, channel: &str) -> Result<Vec<Payload>>;

    /// Highest-versioned payload attached to `channel`.
    ///
    /// When several payloads share the top version any of them may be
    /// returned.
    async fn latest_payload(&self, channel: &str) -> Result<Option<Payload>>;

    /// Every payload row, attached or not, in insertion order.
    async fn list_payloads(&self) -> Result<Vec<Payload>>;

    /// Fold `old_id` into `new_id`: every channel of `old_id` is attached to
    /// `new_id` instead, then the `old_id` rows are removed. Runs as one
    /// transaction. Merging an id into itself is a no-op.
    async fn merge_payloads(&self, old_id: &str, new_id: &str) -> Result<()>;
}

/// Per-channel settings.
#[async_trait]
pub trait ChannelPolicyStore: Send + Sync {
    /// Force-downgrade flag for `channel`; `false` when never set.
    async fn force_downgrade(&self, channel: &str) -> Result<bool>;

    /// Upsert the force-downgrade flag for `channel`.
    async fn set_force_downgrade(&self, channel: &str, value: bool) -> Result<()>;
}

/// Append-only log of client-reported events.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append an event stamped with the current UTC time. Unknown
    /// type/result codes are stored as given.
    async fn log_event(&self, client_id: &str, event_type: i32, result: i32) -> Result<()>;

    /// All events, oldest first. Events logged within the same second keep
    /// their insertion order.
    async fn list_events(&self) -> Result<Vec<Event>>;
}

/// The three storage views over one shared backend.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn PayloadCatalog>,
    pub policies: Arc<dyn ChannelPolicyStore>,
    pub events: Arc<dyn EventLog>,
}

impl Storage {
    /// Bundle a backend that implements all three stores.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: PayloadCatalog + ChannelPolicyStore + EventLog + 'static,
    {
        Self {
            catalog: backend.clone(),
            policies: backend.clone(),
            events: backend,
        }
    }
}

/// Initialize storage based on configuration.
pub async fn init_storage(config: &StorageConfig) -> Result<Storage> {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: memory");
            Ok(Storage::from_backend(Arc::new(MemoryStore::new())))
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(path = %config.path, "Storage: sqlite");
            if let Some(parent) = std::path::Path::new(&config.path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let store = SqliteStore::connect(&config.path).await?;
            store.init().await?;
            Ok(Storage::from_backend(Arc::new(store)))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => Err(StorageError::BackendNotEnabled("sqlite".to_string())),
    }
}
