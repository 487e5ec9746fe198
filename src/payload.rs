//! Payload metadata record.

use serde::Serialize;

use crate::version::Version;

/// One distributable update artifact as known to the catalog.
///
/// The bytes live in a [`PayloadStore`](crate::payload_store::PayloadStore);
/// `id` is the handle returned by that store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    pub id: String,
    pub version: Version,
    /// Size in bytes.
    pub size: u64,
    /// Base64-encoded SHA-1 digest of the bytes.
    pub sha1: String,
    /// Base64-encoded SHA-256 digest of the bytes.
    pub sha256: String,
}

impl Payload {
    pub fn new(
        id: impl Into<String>,
        version: Version,
        size: u64,
        sha1: impl Into<String>,
        sha256: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            version,
            size,
            sha1: sha1.into(),
            sha256: sha256.into(),
        }
    }

    /// Rendered version text, as shown in image listings.
    pub fn version_string(&self) -> String {
        self.version.to_string()
    }
}
