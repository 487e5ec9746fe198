//! Update resolution.
//!
//! Decides whether, and to which payload, a client on a channel should be
//! redirected. Read-only over the catalog and channel policy.

use std::sync::Arc;

use tracing::{debug, info};

use crate::payload::Payload;
use crate::storage::{ChannelPolicyStore, PayloadCatalog, Result};
use crate::version::Version;

/// Outcome of resolving a client's version against a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The client should install this payload.
    Update(Payload),
    /// The client already runs what the channel offers.
    UpToDate,
    /// No payload is attached to the channel.
    ChannelNotFound,
}

impl Resolution {
    /// The payload to install, if any. Both non-update outcomes mean
    /// "no update" to a client.
    pub fn into_payload(self) -> Option<Payload> {
        match self {
            Self::Update(payload) => Some(payload),
            Self::UpToDate | Self::ChannelNotFound => None,
        }
    }
}

/// Resolution engine over a catalog and channel policy store.
#[derive(Clone)]
pub struct ResolutionEngine {
    catalog: Arc<dyn PayloadCatalog>,
    policies: Arc<dyn ChannelPolicyStore>,
}

impl ResolutionEngine {
    pub fn new(catalog: Arc<dyn PayloadCatalog>, policies: Arc<dyn ChannelPolicyStore>) -> Self {
        Self { catalog, policies }
    }

    /// Resolve `client` on `channel`.
    ///
    /// Without force-downgrade a client is offered the channel's latest
    /// payload only when it is strictly newer. With force-downgrade the
    /// latest payload is offered to every client not running exactly that
    /// version, newer clients included. Storage failures are returned as
    /// errors and never reported as "no update".
    pub async fn resolve(&self, client: &Version, channel: &str) -> Result<Resolution> {
        let Some(latest) = self.catalog.latest_payload(channel).await? else {
            debug!(channel = %channel, "No payloads on channel");
            return Ok(Resolution::ChannelNotFound);
        };

        let force_downgrade = self.policies.force_downgrade(channel).await?;
        let offer = if force_downgrade {
            latest.version != *client
        } else {
            latest.version > *client
        };

        if offer {
            info!(
                channel = %channel,
                client_version = %client,
                offered_version = %latest.version,
                payload_id = %latest.id,
                force_downgrade,
                "Offering update"
            );
            Ok(Resolution::Update(latest))
        } else {
            debug!(channel = %channel, client_version = %client, "Client up to date");
            Ok(Resolution::UpToDate)
        }
    }
}
