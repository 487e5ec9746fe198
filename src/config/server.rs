//! Server configuration types.

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Externally reachable base URL. Download URLs handed to clients are
    /// built from it.
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:8080".to_string(),
        }
    }
}
