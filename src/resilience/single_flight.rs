//! Per-key request coalescing.
//!
//! The first caller for a key spawns the work; callers arriving while it runs
//! await the same shared result instead of starting their own. The spawned
//! task removes its own entry when the work ends, so a finished flight is
//! never joined even if every caller stopped waiting.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};

struct Flight<T> {
    id: u64,
    result: Shared<BoxFuture<'static, Option<T>>>,
}

/// A group of in-flight operations keyed by `K`.
pub struct SingleFlight<K, T>
where
    K: Eq + Hash,
{
    in_flight: Arc<DashMap<K, Flight<T>>>,
    next_id: Arc<AtomicU64>,
}

impl<K, T> Clone for SingleFlight<K, T>
where
    K: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            in_flight: self.in_flight.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Result of joining a flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined<T> {
    /// `None` if the spawned work panicked or was aborted.
    pub value: Option<T>,
    /// `false` for the caller that started the work.
    pub shared: bool,
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key`, or join the run already in progress.
    ///
    /// The work is spawned onto the runtime, so it completes even if every
    /// caller stops waiting.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> Joined<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (result, shared) = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => (entry.get().result.clone(), true),
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let worker = tokio::spawn(work());
                let in_flight = self.in_flight.clone();

                // Runs to completion independently of the callers; a panic in
                // `work` surfaces as a join error, so cleanup always happens.
                let finisher = tokio::spawn(async move {
                    let value = worker.await.ok();
                    in_flight.remove_if(&key, |_, flight| flight.id == id);
                    value
                });

                let result = async move { finisher.await.ok().flatten() }
                    .boxed()
                    .shared();
                entry.insert(Flight {
                    id,
                    result: result.clone(),
                });
                (result, false)
            }
        };

        Joined {
            value: result.await,
            shared,
        }
    }

    /// Number of keys with work in progress.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
