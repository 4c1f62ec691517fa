//! Resolution cache with single-flight fetches
//!
//! Maps a key to a value that is expensive to obtain (a discovery round trip).
//! Entries are fresh for `item_lifetime`; stale entries are still served while a
//! background refresh runs. Concurrent misses on one key share a single fetch,
//! and a caller that attaches to someone else's fetch waits at most
//! `waiter_timeout` for it.

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::RpcClientResult;

/// Errors surfaced by [`ResolutionCache::get_item_with_wait`]
#[derive(Error, Debug)]
pub enum CacheError<E> {
    /// A waiter gave up on another caller's in-flight fetch
    #[error("Timed out after {waited:?} waiting for the in-flight fetch of '{key}'")]
    Timeout { key: String, waited: Duration },

    /// The fetch itself failed; every caller attached to it sees the same error
    #[error("Fetch of '{key}' failed: {source}")]
    Fetch { key: String, source: Arc<E> },

    /// The fetch task ended without publishing an outcome
    #[error("In-flight fetch of '{key}' ended without an outcome")]
    Abandoned { key: String },
}

impl<E> CacheError<E> {
    pub fn key(&self) -> &str {
        match self {
            Self::Timeout { key, .. } | Self::Fetch { key, .. } | Self::Abandoned { key } => key,
        }
    }
}

/// Boxed future produced by a fetcher
pub type FetchFuture<V, E> = BoxFuture<'static, Result<V, E>>;

type Fetcher<V, E> = Arc<dyn Fn() -> FetchFuture<V, E> + Send + Sync>;

/// `None` until the fetch finishes
type Outcome<V, E> = Option<Result<V, Arc<E>>>;

/// Counters for cache behavior
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub waits: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub waiter_timeouts: u64,
}

struct CacheEntry<V, E> {
    value: V,
    fetched_at: Instant,
    /// Reused by the monitor sweep to refresh the entry
    fetcher: Fetcher<V, E>,
}

struct CacheState<V, E> {
    entries: HashMap<String, CacheEntry<V, E>>,
    in_flight: HashMap<String, watch::Receiver<Outcome<V, E>>>,
}

struct Inner<V, E> {
    config: CacheConfig,
    state: Mutex<CacheState<V, E>>,
    stats: Mutex<CacheStatistics>,
}

enum Plan<V, E> {
    Ready(V),
    Initiated(watch::Receiver<Outcome<V, E>>),
    Wait(watch::Receiver<Outcome<V, E>>),
}

/// Key to value cache with TTL, single-flight fetching and a refresh monitor
pub struct ResolutionCache<V, E> {
    inner: Arc<Inner<V, E>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl<V, E> std::fmt::Debug for ResolutionCache<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("config", &self.inner.config)
            .field("entries", &self.inner.state.lock().entries.len())
            .finish()
    }
}

impl<V, E> ResolutionCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Display + Send + Sync + 'static,
{
    /// Create an empty cache. The monitor is not started.
    pub fn new(config: CacheConfig) -> RpcClientResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    in_flight: HashMap::new(),
                }),
                stats: Mutex::new(CacheStatistics::default()),
            }),
            monitor: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Return the value for `id`, fetching it with `fetcher` when needed.
    ///
    /// Stale values are returned without blocking. The fetcher is remembered
    /// with the entry so the monitor can refresh it later.
    pub async fn get_item_with_wait<F, Fut>(&self, id: &str, fetcher: F) -> Result<V, CacheError<E>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let fetcher: Fetcher<V, E> = Arc::new(move || fetcher().boxed());

        let plan = {
            let mut state = self.inner.state.lock();
            let cached = state
                .entries
                .get(id)
                .map(|entry| (entry.value.clone(), entry.fetched_at));

            match cached {
                Some((value, fetched_at)) if self.inner.is_fresh(fetched_at) => {
                    self.inner.stats.lock().hits += 1;
                    Plan::Ready(value)
                }
                Some((value, _)) => {
                    self.inner.stats.lock().stale_hits += 1;
                    if !state.in_flight.contains_key(id) {
                        debug!(key = id, "Serving stale entry, refreshing in background");
                        Inner::start_fetch_locked(&self.inner, &mut state, id, fetcher);
                    }
                    Plan::Ready(value)
                }
                None => {
                    self.inner.stats.lock().misses += 1;
                    match state.in_flight.get(id) {
                        Some(rx) => Plan::Wait(rx.clone()),
                        None => Plan::Initiated(Inner::start_fetch_locked(
                            &self.inner,
                            &mut state,
                            id,
                            fetcher,
                        )),
                    }
                }
            }
        };

        match plan {
            Plan::Ready(value) => Ok(value),
            Plan::Initiated(rx) => self.await_outcome(id, rx, None).await,
            Plan::Wait(rx) => {
                self.inner.stats.lock().waits += 1;
                let limit = self.inner.config.waiter_timeout;
                self.await_outcome(id, rx, Some(limit)).await
            }
        }
    }

    /// The value for `id` if present and still fresh
    pub fn get_fresh(&self, id: &str) -> Option<V> {
        let state = self.inner.state.lock();
        state
            .entries
            .get(id)
            .filter(|entry| self.inner.is_fresh(entry.fetched_at))
            .map(|entry| entry.value.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Fetches already in flight still complete.
    pub fn clear(&self) {
        self.inner.state.lock().entries.clear();
        info!("Resolution cache cleared");
    }

    pub fn stats(&self) -> CacheStatistics {
        self.inner.stats.lock().clone()
    }

    /// Start refreshes for every stale entry with no fetch in flight.
    /// Returns how many refreshes were started.
    pub fn refresh_stale(&self) -> usize {
        Inner::sweep(&self.inner)
    }

    /// Spawn the periodic sweep. Returns `false` if it is already running.
    pub fn start_monitor(&self) -> bool {
        let mut monitor = self.monitor.lock();
        if monitor.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let period = self.inner.config.monitoring_frequency;
        let weak: Weak<Inner<V, E>> = Arc::downgrade(&self.inner);
        *monitor = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let started = Inner::sweep(&inner);
                if started > 0 {
                    info!(refreshes = started, "Cache monitor refreshing stale entries");
                }
            }
        }));

        info!(period_ms = period.as_millis(), "Cache monitor started");
        true
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the monitor; a later `start_monitor` may start it again
    pub fn shutdown(&self) {
        if let Some(handle) = self.monitor.lock().take() {
            handle.abort();
            info!("Cache monitor stopped");
        }
    }

    async fn await_outcome(
        &self,
        key: &str,
        mut rx: watch::Receiver<Outcome<V, E>>,
        limit: Option<Duration>,
    ) -> Result<V, CacheError<E>> {
        let started = Instant::now();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(outcome) = current {
                return outcome.map_err(|source| CacheError::Fetch {
                    key: key.to_string(),
                    source,
                });
            }

            let tick = match limit {
                Some(limit) => {
                    let waited = started.elapsed();
                    if waited >= limit {
                        self.inner.stats.lock().waiter_timeouts += 1;
                        warn!(key, waited_ms = waited.as_millis(), "Gave up waiting for in-flight fetch");
                        return Err(CacheError::Timeout {
                            key: key.to_string(),
                            waited,
                        });
                    }
                    self.inner.config.waiter_frequency.min(limit - waited)
                }
                None => self.inner.config.waiter_frequency,
            };

            match tokio::time::timeout(tick, rx.changed()).await {
                Ok(Ok(())) | Err(_) => continue,
                Ok(Err(_)) => {
                    let current = rx.borrow().clone();
                    if let Some(outcome) = current {
                        return outcome.map_err(|source| CacheError::Fetch {
                            key: key.to_string(),
                            source,
                        });
                    }
                    return Err(CacheError::Abandoned {
                        key: key.to_string(),
                    });
                }
            }
        }
    }
}

impl<V, E> Inner<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Display + Send + Sync + 'static,
{
    fn is_fresh(&self, fetched_at: Instant) -> bool {
        fetched_at.elapsed() < self.config.item_lifetime
    }

    /// Caller holds the state lock, so the in-flight marker and the decision
    /// to fetch are one step.
    fn start_fetch_locked(
        inner: &Arc<Self>,
        state: &mut CacheState<V, E>,
        key: &str,
        fetcher: Fetcher<V, E>,
    ) -> watch::Receiver<Outcome<V, E>> {
        let (tx, rx) = watch::channel(None);
        state.in_flight.insert(key.to_string(), rx.clone());
        inner.stats.lock().fetches += 1;

        let inner = Arc::clone(inner);
        let key = key.to_string();
        tokio::spawn(async move {
            let result = match AssertUnwindSafe(async { fetcher().await })
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(_) => {
                    // Dropping `tx` without an outcome wakes waiters with `Abandoned`
                    inner.state.lock().in_flight.remove(&key);
                    inner.stats.lock().fetch_failures += 1;
                    warn!(key = %key, "Fetch panicked");
                    return;
                }
            };

            // Entry swap and marker removal happen together under the lock
            let outcome = {
                let mut state = inner.state.lock();
                state.in_flight.remove(&key);
                match result {
                    Ok(value) => {
                        state.entries.insert(
                            key.clone(),
                            CacheEntry {
                                value: value.clone(),
                                fetched_at: Instant::now(),
                                fetcher,
                            },
                        );
                        Ok(value)
                    }
                    Err(error) => Err(Arc::new(error)),
                }
            };

            match &outcome {
                Ok(_) => debug!(key = %key, "Fetch completed"),
                Err(error) => {
                    inner.stats.lock().fetch_failures += 1;
                    warn!(key = %key, error = %error, "Fetch failed");
                }
            }

            let _ = tx.send(Some(outcome));
        });

        rx
    }

    fn sweep(inner: &Arc<Self>) -> usize {
        let mut state = inner.state.lock();
        let stale: Vec<(String, Fetcher<V, E>)> = state
            .entries
            .iter()
            .filter(|(key, entry)| {
                !inner.is_fresh(entry.fetched_at) && !state.in_flight.contains_key(*key)
            })
            .map(|(key, entry)| (key.clone(), Arc::clone(&entry.fetcher)))
            .collect();

        for (key, fetcher) in &stale {
            Self::start_fetch_locked(inner, &mut state, key, Arc::clone(fetcher));
        }
        stale.len()
    }
}

impl<V, E> Drop for ResolutionCache<V, E> {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor.get_mut().take() {
            handle.abort();
        }
    }
}
