//! Deterministic identity of a computation
//!
//! A key is the SHA-256 over the structure's content digest, the ordered
//! tool arguments and the operation id. Every field is length-prefixed so
//! adjacent values cannot be re-split into a different tuple with the same
//! byte stream. The name the structure was uploaded under is not an input.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeorun_core::ToolArguments;

/// Version tag mixed into every key; bump to invalidate all identities
const KEY_DOMAIN: &[u8] = b"zeorun.computation.v1";

/// Hex-encoded SHA-256 identity of one computation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputationKey(String);

impl ComputationKey {
    /// Derive the key for running `arguments` of `operation_id` on `content`
    #[must_use]
    pub fn build(content: &[u8], arguments: &ToolArguments, operation_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(KEY_DOMAIN);
        update_field(&mut hasher, &Sha256::digest(content));

        hasher.update((arguments.len() as u64).to_le_bytes());
        for arg in arguments {
            update_field(&mut hasher, arg.as_bytes());
        }

        update_field(&mut hasher, operation_id.as_bytes());

        Self(format!("{:x}", hasher.finalize()))
    }

    /// Full hex digest
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters of the digest, for log lines
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for ComputationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ComputationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hex SHA-256 of raw structure bytes
#[must_use]
pub fn content_digest(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
