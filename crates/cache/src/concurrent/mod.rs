//! Concurrent access to computation results

mod computation;

pub use computation::{CacheLookup, CacheStatus, ComputationCache};
