//! In-memory single-flight deduplication for concurrent evaluations of the
//! same `(processId, targetSortKey)` (distilled spec §5): the second reader
//! awaits the first's in-flight fold rather than starting a duplicate one.
//!
//! Grounded on the teacher's `request::client::pool::ClientPool`: a
//! `dashmap`-keyed registry of shared, reservable state rather than a
//! single global lock. Here the registry holds one in-flight result slot
//! per key instead of a bucket of reusable clients.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

/// Deduplicates concurrent callers of [`SingleFlight::run`] that share a
/// key: the first caller runs `f`, every other concurrent caller for the
/// same key awaits that same future instead of starting its own. Once the
/// call completes (success or failure) the key is forgotten — this is pure
/// concurrency dedup, not a result cache.
pub struct SingleFlight<K, V> {
    inflight: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` for `key` if no call is in flight for it; otherwise await
    /// the in-flight call's result. A failing call is not cached: the slot
    /// is removed so the next caller for `key` retries fresh.
    pub async fn run<F, Fut, E>(&self, key: K, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        let cell = Arc::clone(
            self.inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );

        let result = cell.get_or_try_init(f).await.map(Clone::clone);
        self.inflight.remove_if(&key, |_, slot| Arc::ptr_eq(slot, &cell));
        result
    }
}
