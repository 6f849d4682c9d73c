//! Retained cache entries

use crate::keys::ComputationKey;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use zeorun_core::ExecutionResult;

/// A successful execution retained under its key
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Identity the result was computed for
    pub key: ComputationKey,
    /// Shared, immutable result
    pub result: Arc<ExecutionResult>,
    /// When the entry was stored
    pub created_at: DateTime<Utc>,
    /// Accounted size, fixed at insertion
    pub size_bytes: u64,
}

impl CacheEntry {
    pub fn new(key: ComputationKey, result: Arc<ExecutionResult>) -> Self {
        let size_bytes = result.size_bytes();
        Self {
            key,
            result,
            created_at: Utc::now(),
            size_bytes,
        }
    }
}
