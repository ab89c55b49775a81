//! Lazy-loading controller
//!
//! # Design
//! - **Per-record supersede**: at most one live in-flight load exists per
//!   key. A new request for a key already loading takes over its
//!   generation; the older task's eventual result is discarded without
//!   any notification. Cancellation is logical, not physical: the
//!   transport request is never aborted, only its result ignored.
//! - **Preload de-dup**: speculative fetches skip keys already cached or
//!   in flight, and their failures are logged rather than surfaced.
//! - **Atomic completion**: a finished load takes the state lock once and
//!   performs the generation check, cache insert, and event send while
//!   holding it, so no partial update is ever observable.
//!
//! Results are classified by declared content type (JSON / text /
//! binary); binary payloads live behind revocable [`Blob`] handles that
//! release on eviction or [`clear`](LazyLoader::clear).

mod content;
mod http;

pub use content::{Blob, LoadedContent, RawResponse};
pub use http::HttpLoader;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::mpsc;

use crate::error::LoadError;

/// Fetches the raw content behind a record key.
#[async_trait]
pub trait ContentLoader<K: Send + Sync>: Send + Sync {
    async fn fetch(&self, key: &K) -> Result<RawResponse, LoadError>;
}

/// Bound alias for keys the controller can track.
pub trait LoadKey: Eq + Hash + Clone + Send + Sync + fmt::Debug + 'static {}
impl<K: Eq + Hash + Clone + Send + Sync + fmt::Debug + 'static> LoadKey for K {}

/// Result-ready notifications delivered on the event channel.
#[derive(Debug)]
pub enum LoadEvent<K> {
    /// A non-superseded load resolved; the content is also cached.
    Ready { key: K, content: Arc<LoadedContent> },
    /// A non-superseded, non-preload load failed. Other in-flight loads
    /// are unaffected.
    Failed { key: K, error: LoadError },
}

struct LoaderState<K: LoadKey> {
    /// Monotonic ticket counter; the value in `in_flight` is the only
    /// generation allowed to land a result for that key.
    next_generation: u64,
    in_flight: HashMap<K, u64>,
    cache: LruCache<K, Arc<LoadedContent>>,
}

/// Asynchronous per-record loader with in-flight superseding, preload,
/// and an LRU result cache.
pub struct LazyLoader<K: LoadKey, L: ContentLoader<K> + 'static> {
    loader: Arc<L>,
    state: Arc<Mutex<LoaderState<K>>>,
    events: mpsc::UnboundedSender<LoadEvent<K>>,
}

impl<K: LoadKey, L: ContentLoader<K> + 'static> LazyLoader<K, L> {
    /// Create a controller and the receiving end of its notification
    /// channel. Must be called within a tokio runtime context (fetches
    /// run as spawned tasks).
    pub fn new(loader: L, cache_capacity: NonZeroUsize) -> (Self, mpsc::UnboundedReceiver<LoadEvent<K>>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = LazyLoader {
            loader: Arc::new(loader),
            state: Arc::new(Mutex::new(LoaderState {
                next_generation: 0,
                in_flight: HashMap::new(),
                cache: LruCache::new(cache_capacity),
            })),
            events,
        };
        (controller, receiver)
    }

    /// Request the content for `key`.
    ///
    /// A cache hit resolves immediately with a `Ready` event and no
    /// fetch. Otherwise a fetch begins; if one was already in flight for
    /// this key it is superseded — the most recent request for a key
    /// wins, regardless of response arrival order.
    pub fn request(&self, key: K) {
        let generation = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if let Some(content) = state.cache.get(&key) {
                let content = Arc::clone(content);
                let _ = self.events.send(LoadEvent::Ready { key, content });
                return;
            }
            if state.in_flight.contains_key(&key) {
                tracing::debug!(?key, "superseding in-flight load");
            }
            let generation = state.next_generation;
            state.next_generation += 1;
            state.in_flight.insert(key.clone(), generation);
            generation
        };
        self.spawn_fetch(key, generation, true);
    }

    /// Fire-and-forget a batch of speculative fetches. Keys already
    /// cached or in flight are skipped; failures are logged and never
    /// surfaced as events.
    pub fn preload(&self, keys: impl IntoIterator<Item = K>) {
        for key in keys {
            let generation = {
                // Fire-and-forget per key: one bad lock skips that key,
                // not the rest of the batch.
                let Ok(mut state) = self.state.lock() else {
                    continue;
                };
                if state.cache.contains(&key) || state.in_flight.contains_key(&key) {
                    continue;
                }
                let generation = state.next_generation;
                state.next_generation += 1;
                state.in_flight.insert(key.clone(), generation);
                generation
            };
            self.spawn_fetch(key, generation, false);
        }
    }

    /// Cached content for `key`, refreshing its LRU position.
    pub fn cached(&self, key: &K) -> Option<Arc<LoadedContent>> {
        let Ok(mut state) = self.state.lock() else {
            return None;
        };
        state.cache.get(key).cloned()
    }

    /// Whether a live (non-superseded) load is in flight for `key`.
    pub fn is_loading(&self, key: &K) -> bool {
        self.state
            .lock()
            .map(|state| state.in_flight.contains_key(key))
            .unwrap_or(false)
    }

    /// Drop all cached results and logically cancel every in-flight
    /// load. Binary payloads release as their handles drop.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.in_flight.clear();
            state.cache.clear();
        }
    }

    fn spawn_fetch(&self, key: K, generation: u64, surface_errors: bool) {
        let loader = Arc::clone(&self.loader);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = loader
                .fetch(&key)
                .await
                .and_then(LoadedContent::classify);

            let Ok(mut state) = state.lock() else {
                return;
            };
            if state.in_flight.get(&key) != Some(&generation) {
                // Superseded (or cleared) while we were fetching. This is
                // expected control flow, not a failure.
                tracing::debug!(?key, generation, "discarding superseded load result");
                return;
            }
            state.in_flight.remove(&key);
            match result {
                Ok(content) => {
                    let content = Arc::new(content);
                    state.cache.put(key.clone(), Arc::clone(&content));
                    let _ = events.send(LoadEvent::Ready { key, content });
                }
                Err(error) => {
                    if surface_errors {
                        let _ = events.send(LoadEvent::Failed { key, error });
                    } else {
                        tracing::warn!(?key, %error, "preload failed");
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Loader whose completions are manually released, so tests control
    /// response arrival order.
    struct GatedLoader {
        fetches: AtomicUsize,
        gate: Notify,
    }

    impl GatedLoader {
        fn new() -> Self {
            GatedLoader {
                fetches: AtomicUsize::new(0),
                gate: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl ContentLoader<String> for GatedLoader {
        async fn fetch(&self, key: &String) -> Result<RawResponse, LoadError> {
            let ticket = self.fetches.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(RawResponse::new(
                "text/plain",
                format!("{key}#{ticket}").into_bytes(),
            ))
        }
    }

    async fn next_event(
        rx: &mut mpsc::UnboundedReceiver<LoadEvent<String>>,
    ) -> LoadEvent<String> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for load event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn second_request_supersedes_first() {
        let (loader, mut rx) =
            LazyLoader::new(GatedLoader::new(), NonZeroUsize::new(8).unwrap());
        let key = "a".to_string();

        loader.request(key.clone());
        // Let the first fetch task reach the gate before superseding it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        loader.request(key.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        loader.loader.gate.notify_waiters();

        let event = next_event(&mut rx).await;
        let LoadEvent::Ready { content, .. } = event else {
            panic!("expected ready event");
        };
        // Only the second request's result lands.
        assert_eq!(content.as_text(), Some("a#1"));
        assert_eq!(loader.cached(&key).unwrap().as_text(), Some("a#1"));

        // The superseded first response produced no further event.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn cache_hit_resolves_without_fetch() {
        let (loader, mut rx) =
            LazyLoader::new(GatedLoader::new(), NonZeroUsize::new(8).unwrap());
        loader.request("k".to_string());
        tokio::time::sleep(Duration::from_millis(20)).await;
        loader.loader.gate.notify_waiters();
        let _ = next_event(&mut rx).await;

        let fetches_before = loader.loader.fetches.load(Ordering::SeqCst);
        loader.request("k".to_string());
        let event = next_event(&mut rx).await;
        assert!(matches!(event, LoadEvent::Ready { .. }));
        assert_eq!(loader.loader.fetches.load(Ordering::SeqCst), fetches_before);
    }

    #[tokio::test]
    async fn preload_skips_keys_in_flight() {
        let (loader, _rx) =
            LazyLoader::new(GatedLoader::new(), NonZeroUsize::new(8).unwrap());
        loader.request("p".to_string());
        tokio::time::sleep(Duration::from_millis(20)).await;
        loader.preload(["p".to_string()]);
        tokio::time::sleep(Duration::from_millis(20)).await;
        // The preload did not start a second fetch.
        assert_eq!(loader.loader.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_discards_in_flight_results() {
        let (loader, mut rx) =
            LazyLoader::new(GatedLoader::new(), NonZeroUsize::new(8).unwrap());
        loader.request("c".to_string());
        tokio::time::sleep(Duration::from_millis(20)).await;
        loader.clear();
        loader.loader.gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert!(loader.cached(&"c".to_string()).is_none());
    }

    #[tokio::test]
    async fn preload_skips_keys_when_state_is_unusable() {
        let (loader, _rx) =
            LazyLoader::new(GatedLoader::new(), NonZeroUsize::new(8).unwrap());
        let state = Arc::clone(&loader.state);
        let _ = std::thread::spawn(move || {
            let _guard = state.lock().unwrap();
            panic!("poison the loader state");
        })
        .join();

        // Each key is skipped independently; nothing panics and no
        // fetches start.
        loader.preload(["x".to_string(), "y".to_string()]);
        assert_eq!(loader.loader.fetches.load(Ordering::SeqCst), 0);
        assert!(!loader.is_loading(&"x".to_string()));
    }

    struct FailingLoader;

    #[async_trait]
    impl ContentLoader<String> for FailingLoader {
        async fn fetch(&self, key: &String) -> Result<RawResponse, LoadError> {
            Err(LoadError::Http {
                url: key.clone(),
                message: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn request_failures_surface_but_preload_failures_do_not() {
        let (loader, mut rx) = LazyLoader::new(FailingLoader, NonZeroUsize::new(8).unwrap());

        loader.preload(["quiet".to_string()]);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        loader.request("loud".to_string());
        let event = next_event(&mut rx).await;
        let LoadEvent::Failed { key, error } = event else {
            panic!("expected failure event");
        };
        assert_eq!(key, "loud");
        assert!(matches!(error, LoadError::Http { .. }));
        // Failures are not cached.
        assert!(loader.cached(&"loud".to_string()).is_none());
    }
}
