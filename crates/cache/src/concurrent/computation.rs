//! Single-flight computation cache
//!
//! The first request for a key becomes the leader: it spawns the computation
//! as a detached task and registers a watch channel in `in_flight`. Requests
//! arriving while that task runs subscribe to the channel instead of
//! executing. The task stores a successful result before removing its
//! in-flight entry, so a concurrent request finds one or the other.

use crate::entry::CacheEntry;
use crate::eviction::{BoundedLru, InsertOutcome};
use crate::keys::ComputationKey;
use crate::stats::{CacheStatSnapshot, CacheStats};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use zeorun_core::{Error, ExecutionResult, Result};

/// Outcome broadcast to coalesced waiters; hard errors travel as text
type Shared = std::result::Result<Arc<ExecutionResult>, String>;

/// How a request was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// This request triggered the execution
    Miss,
    /// Served from a retained result
    Hit,
    /// Waited on an execution started by another request
    Coalesced,
}

impl CacheStatus {
    /// Whether the request was served without its own execution
    #[must_use]
    pub fn cached(self) -> bool {
        !matches!(self, CacheStatus::Miss)
    }
}

/// Result handed back to a caller
#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub result: Arc<ExecutionResult>,
    pub status: CacheStatus,
}

#[derive(Clone)]
struct InFlight {
    /// Distinguishes successive flights for the same key
    id: u64,
    rx: watch::Receiver<Option<Shared>>,
}

/// Bounded result cache with per-key request coalescing
pub struct ComputationCache {
    completed: Mutex<BoundedLru>,
    in_flight: DashMap<ComputationKey, InFlight>,
    next_flight: AtomicU64,
    stats: CacheStats,
}

impl ComputationCache {
    pub fn new(max_entries: NonZeroUsize, max_bytes: u64) -> Self {
        Self {
            completed: Mutex::new(BoundedLru::new(max_entries, max_bytes)),
            in_flight: DashMap::new(),
            next_flight: AtomicU64::new(0),
            stats: CacheStats::default(),
        }
    }

    /// Return the retained result for `key`, join the execution in flight,
    /// or run `compute` as the leader.
    ///
    /// `compute` is invoked at most once per call and only when this call
    /// leads. Its future runs on a detached task, so dropping this call
    /// does not abort the execution other requests may be waiting on.
    pub async fn get_or_compute<F, Fut>(
        self: &Arc<Self>,
        key: &ComputationKey,
        compute: F,
    ) -> Result<CacheLookup>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ExecutionResult>> + Send + 'static,
    {
        if let Some(result) = self.lookup(key) {
            return Ok(self.hit(key, result));
        }

        let (rx, leader) = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(occupied) => (occupied.get().rx.clone(), None),
            Entry::Vacant(vacant) => {
                // A flight may have finished between the lookup above and
                // acquiring this shard
                if let Some(result) = self.lookup(key) {
                    drop(vacant);
                    return Ok(self.hit(key, result));
                }
                let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = watch::channel(None);
                vacant.insert(InFlight { id, rx: rx.clone() });
                (rx, Some((id, tx)))
            }
        };

        match leader {
            Some((id, tx)) => {
                CacheStats::record(&self.stats.misses);
                tracing::debug!(key = %key.short(), "cache miss, starting execution");

                let (done_tx, done_rx) = oneshot::channel();
                let cache = Arc::clone(self);
                let flight_key = key.clone();
                let fut = compute();
                tokio::spawn(async move {
                    cache.drive(flight_key, id, fut, tx, done_tx).await;
                });

                let result = done_rx.await.map_err(|_| {
                    Error::shared_execution(key.as_str(), "computation task ended unexpectedly")
                })??;
                Ok(CacheLookup {
                    result,
                    status: CacheStatus::Miss,
                })
            }
            None => {
                CacheStats::record(&self.stats.coalesced);
                tracing::debug!(key = %key.short(), "joining in-flight execution");
                let result = wait_shared(key, rx).await?;
                Ok(CacheLookup {
                    result,
                    status: CacheStatus::Coalesced,
                })
            }
        }
    }

    async fn drive<Fut>(
        self: Arc<Self>,
        key: ComputationKey,
        id: u64,
        fut: Fut,
        tx: watch::Sender<Option<Shared>>,
        done: oneshot::Sender<Result<Arc<ExecutionResult>>>,
    ) where
        Fut: Future<Output = Result<ExecutionResult>>,
    {
        // Clears the in-flight entry even if `fut` panics; waiters then see
        // the channel close
        let guard = FlightGuard {
            cache: &self,
            key: &key,
            id,
        };

        let outcome = fut.await.map(Arc::new);
        match &outcome {
            Ok(result) if result.success() => self.store(&key, Arc::clone(result)),
            Ok(result) => {
                CacheStats::record(&self.stats.failures);
                tracing::debug!(
                    key = %key.short(),
                    failure = result.failure.as_ref().map(|f| f.label()),
                    "execution failed, result not retained"
                );
            }
            Err(e) => {
                CacheStats::record(&self.stats.failures);
                tracing::warn!(key = %key.short(), error = %e, "execution errored");
            }
        }
        drop(guard);

        let shared = match &outcome {
            Ok(result) => Ok(Arc::clone(result)),
            Err(e) => Err(e.to_string()),
        };
        // No receivers left is not an error
        let _ = tx.send(Some(shared));
        let _ = done.send(outcome);
    }

    fn store(&self, key: &ComputationKey, result: Arc<ExecutionResult>) {
        let entry = CacheEntry::new(key.clone(), result);
        let size = entry.size_bytes;
        let outcome = self.completed.lock().insert(entry);
        match outcome {
            InsertOutcome::Stored { evicted } => {
                CacheStats::add(&self.stats.evictions, evicted as u64);
                tracing::debug!(key = %key.short(), size, evicted, "result cached");
            }
            InsertOutcome::TooLarge => {
                CacheStats::record(&self.stats.rejected_oversize);
                tracing::warn!(key = %key.short(), size, "result exceeds cache byte bound, not retained");
            }
        }
    }

    fn lookup(&self, key: &ComputationKey) -> Option<Arc<ExecutionResult>> {
        self.completed
            .lock()
            .get(key)
            .map(|entry| Arc::clone(&entry.result))
    }

    fn hit(&self, key: &ComputationKey, result: Arc<ExecutionResult>) -> CacheLookup {
        CacheStats::record(&self.stats.hits);
        tracing::debug!(key = %key.short(), "cache hit");
        CacheLookup {
            result,
            status: CacheStatus::Hit,
        }
    }

    /// Retained result for `key`, if any, without executing or waiting
    pub fn get(&self, key: &ComputationKey) -> Option<Arc<ExecutionResult>> {
        self.lookup(key)
    }

    pub fn contains(&self, key: &ComputationKey) -> bool {
        self.completed.lock().contains(key)
    }

    /// Whether an execution for `key` is currently running
    pub fn is_in_flight(&self, key: &ComputationKey) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.completed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.lock().is_empty()
    }

    /// Drop every retained result. Executions in flight are unaffected.
    pub fn clear(&self) {
        self.completed.lock().clear();
    }

    pub fn stats(&self) -> CacheStatSnapshot {
        let completed = self.completed.lock();
        self.stats
            .snapshot(completed.len(), completed.total_bytes())
    }
}

struct FlightGuard<'a> {
    cache: &'a ComputationCache,
    key: &'a ComputationKey,
    id: u64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.cache
            .in_flight
            .remove_if(self.key, |_, flight| flight.id == self.id);
    }
}

async fn wait_shared(
    key: &ComputationKey,
    mut rx: watch::Receiver<Option<Shared>>,
) -> Result<Arc<ExecutionResult>> {
    let shared = {
        let value = rx.wait_for(Option::is_some).await.map_err(|_| {
            Error::shared_execution(key.as_str(), "computation ended without a result")
        })?;
        (*value).clone()
    };

    match shared {
        Some(Ok(result)) => Ok(result),
        Some(Err(message)) => Err(Error::shared_execution(key.as_str(), message)),
        None => Err(Error::shared_execution(
            key.as_str(),
            "computation ended without a result",
        )),
    }
}
