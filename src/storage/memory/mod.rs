//! In-memory storage backend.
//!
//! Keeps the same semantics as the SQLite backend without touching disk.
//! Used for tests and throwaway deployments, with switches to make reads or
//! writes fail on demand.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::event::Event;
use crate::payload::Payload;
use crate::storage::{ChannelPolicyStore, EventLog, PayloadCatalog, Result, StorageError};


#[derive(Default)]
struct State {
    payloads: Vec<Payload>,
    /// `(payload id, channel)` pairs, unique.
    associations: Vec<(String, String)>,
    force_downgrade: HashMap<String, bool>,
    events: Vec<Event>,
}

impl State {
    fn attach(&mut self, id: &str, channel: &str) {
        let exists = self
            .associations
            .iter()
            .any(|(p, c)| p == id && c == channel);
        if !exists {
            self.associations.push((id.to_string(), channel.to_string()));
        }
    }

    fn remove(&mut self, id: &str) {
        self.associations.retain(|(p, _)| p != id);
        self.payloads.retain(|p| p.id != id);
    }

    fn images(&self, channel: &str) -> Vec<Payload> {
        let mut images: Vec<Payload> = self
            .payloads
            .iter()
            .filter(|p| {
                self.associations
                    .iter()
                    .any(|(id, c)| *id == p.id && c == channel)
            })
            .cloned()
            .collect();
        images.sort_by_key(|p| p.version);
        images
    }
}

/// In-memory catalog, channel policy store and event log.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_on_read: RwLock<bool>,
    fail_on_write: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Unavailable("read failure injected".to_string()));
        }
        Ok(())
    }

    async fn check_write(&self) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Unavailable("write failure injected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PayloadCatalog for MemoryStore {
    async fn add_payload(&self, payload: &Payload) -> Result<()> {
        self.check_write().await?;
        self.state.lock().await.payloads.push(payload.clone());
        Ok(())
    }

    async fn payload_exists(&self, id: &str) -> Result<bool> {
        self.check_read().await?;
        Ok(self.state.lock().await.payloads.iter().any(|p| p.id == id))
    }

    async fn attach_to_channel(&self, id: &str, channel: &str) -> Result<()> {
        self.check_write().await?;
        self.state.lock().await.attach(id, channel);
        Ok(())
    }

    async fn publish_payload(&self, payload: &Payload, channel: &str) -> Result<()> {
        self.check_write().await?;
        let mut state = self.state.lock().await;
        state.payloads.push(payload.clone());
        state.attach(&payload.id, channel);
        Ok(())
    }

    async fn delete_payload(&self, id: &str) -> Result<()> {
        self.check_write().await?;
        self.state.lock().await.remove(id);
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<String>> {
        self.check_read().await?;
        let state = self.state.lock().await;
        let mut channels: Vec<String> = state
            .associations
            .iter()
            .map(|(_, c)| c.clone())
            .collect();
        channels.sort();
        channels.dedup();
        Ok(channels)
    }

    async fn list_images(&self, channel: &str) -> Result<Vec<Payload>> {
        self.check_read().await?;
        Ok(self.state.lock().await.images(channel))
    }

    async fn latest_payload(&self, channel: &str) -> Result<Option<Payload>> {
        self.check_read().await?;
        Ok(self.state.lock().await.images(channel).pop())
    }

    async fn list_payloads(&self) -> Result<Vec<Payload>> {
        self.check_read().await?;
        Ok(self.state.lock().await.payloads.clone())
    }

    async fn merge_payloads(&self, old_id: &str, new_id: &str) -> Result<()> {
        self.check_write().await?;
        if old_id == new_id {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        let channels: Vec<String> = state
            .associations
            .iter()
            .filter(|(p, _)| p == old_id)
            .map(|(_, c)| c.clone())
            .collect();
        for channel in &channels {
            state.attach(new_id, channel);
        }
        state.remove(old_id);
        Ok(())
    }
}

#[async_trait]
impl ChannelPolicyStore for MemoryStore {
    async fn force_downgrade(&self, channel: &str) -> Result<bool> {
        self.check_read().await?;
        let state = self.state.lock().await;
        Ok(state.force_downgrade.get(channel).copied().unwrap_or(false))
    }

    async fn set_force_downgrade(&self, channel: &str, value: bool) -> Result<()> {
        self.check_write().await?;
        self.state
            .lock()
            .await
            .force_downgrade
            .insert(channel.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl EventLog for MemoryStore {
    async fn log_event(&self, client_id: &str, event_type: i32, result: i32) -> Result<()> {
        self.check_write().await?;
        self.state.lock().await.events.push(Event {
            client_id: client_id.to_string(),
            event_type,
            result,
            timestamp: Utc::now().trunc_subsecs(0),
        });
        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        self.check_read().await?;
        let mut events = self.state.lock().await.events.clone();
        // Stable sort keeps insertion order within equal timestamps.
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}
