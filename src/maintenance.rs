//! Catalog housekeeping.
//!
//! Ingesting the same build twice leaves several payload rows with one
//! version. [`deduplicate`] collapses each such group onto a single
//! surviving id, one merge transaction per clone, and reports which ids were
//! removed so their bytes can be deleted.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::storage::{PayloadCatalog, Result};

/// One payload id folded into another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedPayload {
    /// Id whose rows were deleted.
    pub removed: String,
    /// Id that now carries the removed id's channels.
    pub kept: String,
    /// Rendered version shared by both.
    pub version: String,
}

/// Merge every payload whose rendered version duplicates an earlier one.
///
/// The first id listed for a version survives. Repeated rows of the
/// surviving id are left alone. An id whose rows carry more than one
/// version is never merged in either direction: a merge moves and deletes
/// every row of an id, so it would drag its other versions along. A failed
/// merge stops the pass; merges that already committed stay committed.
pub async fn deduplicate(catalog: &dyn PayloadCatalog) -> Result<Vec<MergedPayload>> {
    let payloads = catalog.list_payloads().await?;

    let mut versions_of: HashMap<String, HashSet<String>> = HashMap::new();
    // Groups in first-seen order, each with its distinct ids.
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for payload in payloads {
        let version = payload.version_string();
        versions_of
            .entry(payload.id.clone())
            .or_default()
            .insert(version.clone());
        match groups.iter_mut().find(|(v, _)| *v == version) {
            Some((_, ids)) => {
                if !ids.contains(&payload.id) {
                    ids.push(payload.id);
                }
            }
            None => groups.push((version, vec![payload.id])),
        }
    }

    let single_version = |id: &String| versions_of.get(id).is_some_and(|v| v.len() == 1);

    let mut merged = Vec::new();
    for (version, ids) in groups {
        let (mergeable, pinned): (Vec<String>, Vec<String>) =
            ids.into_iter().partition(|id| single_version(id));
        if !pinned.is_empty() && mergeable.len() > 1 {
            warn!(version = %version, ids = ?pinned, "Skipping ids that carry several versions");
        }

        let Some((kept, clones)) = mergeable.split_first() else {
            continue;
        };
        for removed in clones {
            catalog.merge_payloads(removed, kept).await?;
            info!(version = %version, removed = %removed, kept = %kept, "Merged duplicate payload");
            merged.push(MergedPayload {
                removed: removed.clone(),
                kept: kept.clone(),
                version: version.clone(),
            });
        }
    }

    Ok(merged)
}
