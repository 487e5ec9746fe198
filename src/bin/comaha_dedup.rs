//! comaha-dedup: Duplicate payload cleanup
//!
//! Collapses payload rows that share a version onto one surviving id,
//! moving their channel associations over, then deletes the bytes of the
//! removed payloads.
//!
//! ## Usage
//! ```text
//! comaha-dedup [CONFIG_PATH]
//! ```
//!
//! ## Configuration
//! - CONFIG_PATH or COMAHA_CONFIG: YAML config file (optional)
//! - COMAHA__STORAGE__PATH, COMAHA__FILES__PATH: overrides
//! - COMAHA_LOG: log filter (default: info)

use tracing::{error, info, warn};

use comaha::config::Config;
use comaha::maintenance::deduplicate;
use comaha::payload_store::{init_payload_store, PayloadStore, PayloadStoreError};
use comaha::storage::init_storage;
use comaha::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;

    let storage = init_storage(&config.storage).await?;
    let files = init_payload_store(&config.files).await?;

    let merged = match deduplicate(storage.catalog.as_ref()).await {
        Ok(merged) => merged,
        Err(e) => {
            error!(error = %e, "Deduplication failed");
            return Err(e.into());
        }
    };

    let mut freed = 0;
    for entry in &merged {
        match files.delete(&entry.removed).await {
            Ok(()) => freed += 1,
            Err(PayloadStoreError::NotFound(_)) => {
                warn!(payload_id = %entry.removed, "Payload bytes already missing");
            }
            Err(e) => {
                error!(payload_id = %entry.removed, error = %e, "Failed to delete payload bytes");
            }
        }
    }

    info!(merged = merged.len(), freed, "comaha-dedup finished");
    Ok(())
}
