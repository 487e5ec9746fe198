//! Digest checks for payload ingestion.
//!
//! Uploaders send the bytes together with the SHA-1 and SHA-256 digests they
//! expect, base64 encoded with the standard alphabet. Both must match the
//! bytes actually received before anything is stored.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// A claimed digest that does not match the received bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{algorithm} digest mismatch: claimed {claimed:?}, computed {computed:?}")]
pub struct DigestMismatch {
    pub algorithm: &'static str,
    pub claimed: String,
    pub computed: String,
}

/// Base64-encoded digests of a byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digests {
    pub sha1: String,
    pub sha256: String,
}

impl Digests {
    pub fn compute(bytes: &[u8]) -> Self {
        Self {
            sha1: STANDARD.encode(Sha1::digest(bytes)),
            sha256: STANDARD.encode(Sha256::digest(bytes)),
        }
    }
}

/// Compute the digests of `bytes` and compare them with the claimed ones.
///
/// SHA-1 is checked first. An empty claim never matches.
pub fn verify_digests(
    bytes: &[u8],
    claimed_sha1: &str,
    claimed_sha256: &str,
) -> Result<Digests, DigestMismatch> {
    let digests = Digests::compute(bytes);

    if claimed_sha1.is_empty() || claimed_sha1 != digests.sha1 {
        return Err(DigestMismatch {
            algorithm: "sha1",
            claimed: claimed_sha1.to_string(),
            computed: digests.sha1,
        });
    }
    if claimed_sha256.is_empty() || claimed_sha256 != digests.sha256 {
        return Err(DigestMismatch {
            algorithm: "sha256",
            claimed: claimed_sha256.to_string(),
            computed: digests.sha256,
        });
    }

    Ok(digests)
}
