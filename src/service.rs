//! Protocol-agnostic update service.
//!
//! The operations a transport layer needs: answering update checks,
//! recording client events, ingesting new payloads and the operator admin
//! surface. Rendering requests and responses is left to the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::event::Event;
use crate::ingest::{verify_digests, DigestMismatch};
use crate::payload::Payload;
use crate::payload_store::{PayloadStore, PayloadStoreError};
use crate::resolver::{Resolution, ResolutionEngine};
use crate::storage::{Storage, StorageError};
use crate::version::{MalformedVersion, Version};

/// Errors surfaced by [`UpdateService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Malformed version: {0}")]
    MalformedVersion(#[from] MalformedVersion),

    #[error(transparent)]
    DigestMismatch(#[from] DigestMismatch),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Payload store error: {0}")]
    PayloadStore(#[from] PayloadStoreError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// A payload offered to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOffer {
    /// Download URL prefix; the client appends the payload id.
    pub url: String,
    pub payload: Payload,
}

/// Answer to an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    Update(UpdateOffer),
    NoUpdate,
}

/// Update service over storage and a payload byte store.
#[derive(Clone)]
pub struct UpdateService {
    storage: Storage,
    files: Arc<dyn PayloadStore>,
    engine: ResolutionEngine,
    public_url: String,
}

impl UpdateService {
    pub fn new(storage: Storage, files: Arc<dyn PayloadStore>, public_url: impl Into<String>) -> Self {
        let engine = ResolutionEngine::new(storage.catalog.clone(), storage.policies.clone());
        Self {
            storage,
            files,
            engine,
            public_url: public_url.into(),
        }
    }

    /// Decide whether a client reporting `version` on `channel` should
    /// update.
    pub async fn check_update(&self, version: &str, channel: &str) -> Result<UpdateCheck> {
        let client = Version::parse(version)?;

        match self.engine.resolve(&client, channel).await? {
            Resolution::Update(payload) => Ok(UpdateCheck::Update(UpdateOffer {
                url: self.files.update_url(&self.public_url),
                payload,
            })),
            Resolution::UpToDate | Resolution::ChannelNotFound => Ok(UpdateCheck::NoUpdate),
        }
    }

    /// Record an event reported by a client.
    pub async fn report_event(&self, client_id: &str, event_type: i32, result: i32) -> Result<()> {
        self.storage.events.log_event(client_id, event_type, result).await?;
        Ok(())
    }

    /// Verify, store and publish a new payload on `channel`.
    ///
    /// Nothing is stored unless the version parses and both digests match.
    /// When the catalog write fails the stored bytes are removed again.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        sha1: &str,
        sha256: &str,
        version: &str,
        channel: &str,
    ) -> Result<Payload> {
        let version = Version::parse(version)?;
        let digests = verify_digests(bytes, sha1, sha256)?;

        let id = self.files.store(bytes).await?;
        let payload = Payload::new(id, version, bytes.len() as u64, digests.sha1, digests.sha256);

        if let Err(e) = self.storage.catalog.publish_payload(&payload, channel).await {
            if let Err(cleanup) = self.files.delete(&payload.id).await {
                warn!(
                    payload_id = %payload.id,
                    error = %cleanup,
                    "Failed to remove bytes of unpublished payload"
                );
            }
            return Err(e.into());
        }

        info!(
            payload_id = %payload.id,
            version = %payload.version,
            channel = %channel,
            size = payload.size,
            "Ingested payload"
        );
        Ok(payload)
    }

    /// Delete a payload from the catalog and its bytes from the store.
    ///
    /// Returns `false` when no payload carries `id`. Bytes that are already
    /// gone are logged and otherwise ignored.
    pub async fn delete_payload(&self, id: &str) -> Result<bool> {
        if !self.storage.catalog.payload_exists(id).await? {
            return Ok(false);
        }

        self.storage.catalog.delete_payload(id).await?;
        match self.files.delete(id).await {
            Ok(()) => {}
            Err(PayloadStoreError::NotFound(_)) => {
                warn!(payload_id = %id, "Payload bytes already missing");
            }
            Err(e) => return Err(e.into()),
        }

        info!(payload_id = %id, "Deleted payload");
        Ok(true)
    }

    pub async fn set_force_downgrade(&self, channel: &str, value: bool) -> Result<()> {
        self.storage.policies.set_force_downgrade(channel, value).await?;
        info!(channel = %channel, force_downgrade = value, "Channel policy updated");
        Ok(())
    }

    pub async fn force_downgrade(&self, channel: &str) -> Result<bool> {
        Ok(self.storage.policies.force_downgrade(channel).await?)
    }

    pub async fn list_channels(&self) -> Result<Vec<String>> {
        Ok(self.storage.catalog.list_channels().await?)
    }

    pub async fn list_images(&self, channel: &str) -> Result<Vec<Payload>> {
        Ok(self.storage.catalog.list_images(channel).await?)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        Ok(self.storage.events.list_events().await?)
    }
}
