//! Single-flight, negative-caching tile cache.
//!
//! Public contract: `serve(fingerprint, ttl, fetch) -> bytes`. An empty byte
//! string is a meaningful cache entry ("no features for this coordinate"),
//! distinct from absence ("not yet computed"). For any given fingerprint, at
//! most one `fetch` is in flight across all concurrent callers; the rest
//! wait on the leader and observe its published result or failure.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Notify;

use crate::backend::{CacheBackend, CacheOptions};

/// The three kinds of tile this service serves, each with its own TTL.
///
/// Admin boundaries are effectively static between deployments; forest and
/// cadastre data may be refreshed by an external importer at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    /// Forest-cover tiles.
    Forest,
    /// Administrative-boundary tiles.
    Admin,
    /// Cadastral-parcel tiles.
    Cadastre,
}

impl TileKind {
    /// The fingerprint segment identifying this kind, e.g. `tile:foret:...`.
    pub fn fingerprint_segment(self) -> &'static str {
        match self {
            Self::Forest => "foret",
            Self::Admin => "admin",
            Self::Cadastre => "cadastre",
        }
    }

    /// The TTL policy for this kind: forest/cadastre 24h, admin 7d.
    pub fn ttl(self) -> Duration {
        match self {
            Self::Forest | Self::Cadastre => Duration::from_secs(24 * 3600),
            Self::Admin => Duration::from_secs(7 * 24 * 3600),
        }
    }
}

struct Pending<E> {
    notify: Notify,
    outcome: Mutex<Option<Result<Bytes, E>>>,
}

impl<E> Pending<E> {
    fn new() -> Self {
        Self {
            notify: Notify::new(),
            outcome: Mutex::new(None),
        }
    }
}

/// A single-flight, negative-caching front for a [`CacheBackend`].
///
/// `E` is the error type of the caller-supplied `fetch` closures; it must be
/// `Clone` so the same outcome can be handed to every waiter.
pub struct SingleFlightCache<B: CacheBackend, E> {
    backend: Arc<B>,
    in_flight: DashMap<String, Arc<Pending<E>>>,
}

impl<B, E> SingleFlightCache<B, E>
where
    B: CacheBackend + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates a new single-flight cache over the given backend.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            in_flight: DashMap::new(),
        }
    }

    /// Serves `fingerprint`: on a cache hit, returns the stored bytes
    /// directly (possibly empty). On a miss, exactly one concurrent caller
    /// runs `fetch`; the rest wait for its result. The result is stored
    /// under `ttl`, including an empty result, without blocking the return
    /// to the caller.
    pub async fn serve<F, Fut>(&self, fingerprint: &str, ttl: Duration, fetch: F) -> Result<Bytes, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, E>>,
    {
        if let Ok(Some(entry)) = self.backend.get(fingerprint).await {
            return Ok(entry.value);
        }

        let (pending, is_leader) = match self.in_flight.entry(fingerprint.to_string()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), false),
            Entry::Vacant(vacant) => {
                let pending = Arc::new(Pending::new());
                vacant.insert(pending.clone());
                (pending, true)
            }
        };

        if !is_leader {
            // `enable()` registers this waiter before we check `outcome`, so a
            // leader that publishes and calls `notify_waiters()` between our
            // entry lookup and this point still wakes us — otherwise that
            // window is a lost wakeup and we'd await a notification that
            // already happened.
            let notified = pending.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let outcome = pending
                .outcome
                .lock()
                .expect("pending outcome mutex poisoned")
                .clone();
            if let Some(outcome) = outcome {
                return outcome;
            }

            notified.await;
            let outcome = pending
                .outcome
                .lock()
                .expect("pending outcome mutex poisoned")
                .clone();
            return outcome.expect("leader always publishes an outcome before notifying");
        }

        let result = fetch().await;

        *pending
            .outcome
            .lock()
            .expect("pending outcome mutex poisoned") = Some(result.clone());
        self.in_flight.remove(fingerprint);
        pending.notify.notify_waiters();

        if let Ok(ref bytes) = result {
            let backend = Arc::clone(&self.backend);
            let key = fingerprint.to_string();
            let value = bytes.clone();
            tokio::spawn(async move {
                let options = CacheOptions {
                    ttl: Some(ttl),
                    ..Default::default()
                };
                if let Err(err) = backend.set(&key, value, options).await {
                    tracing::warn!(fingerprint = %key, error = %err, "tile cache write failed, will recompute on next request");
                }
            });
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn ttl_policy_matches_kind() {
        assert_eq!(TileKind::Forest.ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(TileKind::Cadastre.ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(TileKind::Admin.ttl(), Duration::from_secs(7 * 24 * 3600));
    }

    #[tokio::test]
    async fn hit_returns_stored_bytes_without_calling_fetch() {
        let backend = Arc::new(MemoryCache::lru(100));
        backend
            .set(
                "tile:foret:10:1:1",
                Bytes::from_static(b"cached"),
                CacheOptions::default(),
            )
            .await
            .unwrap();

        let cache: SingleFlightCache<_, String> = SingleFlightCache::new(backend);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();

        let result = cache
            .serve("tile:foret:10:1:1", Duration::from_secs(1), || async move {
                calls2.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Bytes::from_static(b"fresh"))
            })
            .await
            .unwrap();

        assert_eq!(result, Bytes::from_static(b"cached"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn miss_invokes_fetch_and_stores_empty_result() {
        let backend = Arc::new(MemoryCache::lru(100));
        let cache: SingleFlightCache<_, String> = SingleFlightCache::new(backend.clone());

        let result = cache
            .serve("tile:foret:10:1:1", Duration::from_secs(1), || async {
                Ok::<_, String>(Bytes::new())
            })
            .await
            .unwrap();
        assert!(result.is_empty());

        // Background publish races the return; give it a turn to land.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stored = backend.get("tile:foret:10:1:1").await.unwrap();
        assert!(stored.is_some());
        assert!(stored.unwrap().value.is_empty());
    }

    #[tokio::test]
    async fn concurrent_misses_collapse_into_one_fetch() {
        let backend = Arc::new(MemoryCache::lru(100));
        let cache = Arc::new(SingleFlightCache::<_, String>::new(backend));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .serve("tile:foret:10:1:1", Duration::from_secs(1), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, String>(Bytes::from_static(b"shared"))
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result, Bytes::from_static(b"shared"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
