//! Computation cache for zeorun
//!
//! Maps a `ComputationKey` (structure content, tool arguments, operation id)
//! to the `ExecutionResult` it produced. Concurrent requests for the same key
//! share a single execution; only successful results are retained.

pub mod concurrent;
pub mod entry;
pub mod eviction;
pub mod keys;
pub mod stats;

pub use concurrent::{CacheLookup, CacheStatus, ComputationCache};
pub use entry::CacheEntry;
pub use eviction::{BoundedLru, InsertOutcome};
pub use keys::{content_digest, ComputationKey};
pub use stats::CacheStatSnapshot;
