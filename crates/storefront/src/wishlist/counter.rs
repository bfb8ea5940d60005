//! Wishlist count reconciliation.
//!
//! [`WishlistCounter`] keeps a best-known wishlist count for the active user
//! by preferring the remote store and falling back to the local cache:
//!
//! - signed out: the count is 0 and no network is touched
//! - remote fetch succeeds: the count is the response length, and the
//!   normalized items are written through to the local cache
//! - remote fetch fails (network, auth, malformed body): the count is
//!   whatever the local cache holds; the failure never surfaces past here
//!
//! [`WishlistCounter::spawn_watcher`] drives refreshes the way a mounted UI
//! element would: once on start, on every change-bus notification, and on a
//! fixed poll interval as a safety net while a user is present. Overlapping
//! refresh triggers are not sequenced against each other; the last settle
//! wins, which is acceptable for an eventually-consistent display counter.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::api::ApiClient;
use crate::auth::Session;

use super::bus::{ChangeBus, Subscription};
use super::store::WishlistCache;

/// Where the settled count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    /// Authoritative remote fetch.
    Remote,
    /// Remote unreachable; local cache value.
    CacheFallback,
    /// No authenticated user.
    SignedOut,
}

/// A settled count and its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountSnapshot {
    pub count: usize,
    pub source: CountSource,
}

impl CountSnapshot {
    const fn signed_out() -> Self {
        Self {
            count: 0,
            source: CountSource::SignedOut,
        }
    }
}

/// Reconciling wishlist counter. Cheap to clone.
#[derive(Clone)]
pub struct WishlistCounter {
    inner: Arc<CounterInner>,
}

struct CounterInner {
    api: ApiClient,
    session: Arc<dyn Session>,
    cache: WishlistCache,
    bus: ChangeBus,
    snapshot: RwLock<CountSnapshot>,
}

impl WishlistCounter {
    /// Create a counter over the given collaborators.
    #[must_use]
    pub fn new(
        api: ApiClient,
        session: Arc<dyn Session>,
        cache: WishlistCache,
        bus: ChangeBus,
    ) -> Self {
        Self {
            inner: Arc::new(CounterInner {
                api,
                session,
                cache,
                bus,
                snapshot: RwLock::new(CountSnapshot::signed_out()),
            }),
        }
    }

    /// The last settled count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.snapshot().count
    }

    /// The last settled count with its provenance.
    #[must_use]
    pub fn snapshot(&self) -> CountSnapshot {
        *self
            .inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, snapshot: CountSnapshot) {
        let mut guard = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }

    /// Reconcile now and return the settled count.
    ///
    /// Concurrent calls are not sequenced; whichever settles last overwrites
    /// the snapshot.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> usize {
        let Some(user) = self.inner.session.current_user() else {
            self.settle(CountSnapshot::signed_out());
            return 0;
        };

        let snapshot = match self.inner.api.get_wishlist().await {
            Ok(entries) => {
                let count = entries.len();
                let items: Vec<_> = entries
                    .into_iter()
                    .filter_map(crate::api::WishlistEntry::normalize)
                    .collect();
                self.inner.cache.put(&user.email, &items);
                CountSnapshot {
                    count,
                    source: CountSource::Remote,
                }
            }
            Err(e) => {
                debug!(user = %user.email, error = %e, "remote wishlist unavailable, using cache");
                CountSnapshot {
                    count: self.inner.cache.count(&user.email),
                    source: CountSource::CacheFallback,
                }
            }
        };

        self.settle(snapshot);
        snapshot.count
    }

    /// Start the refresh loop: initial refresh, change-bus wakes, and the
    /// safety-net poll (skipped while signed out).
    ///
    /// Dropping the returned handle stops the loop and drops the bus
    /// subscription - the teardown a consumer performs on unmount.
    #[must_use = "dropping the handle stops the watcher"]
    pub fn spawn_watcher(&self, poll_interval: Duration) -> WatcherHandle {
        let (wake_tx, mut wake_rx) = mpsc::unbounded_channel::<()>();
        let subscription = self.inner.bus.subscribe(move || {
            // A full send queue cannot happen (unbounded); a closed channel
            // means the watcher already stopped.
            let _ = wake_tx.send(());
        });

        let counter = self.clone();
        let task = tokio::spawn(async move {
            counter.refresh().await;

            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval fires immediately; the initial refresh covered that.
            ticker.tick().await;

            loop {
                tokio::select! {
                    wake = wake_rx.recv() => {
                        if wake.is_none() {
                            break;
                        }
                        counter.refresh().await;
                    }
                    _ = ticker.tick() => {
                        if counter.inner.session.current_user().is_some() {
                            counter.refresh().await;
                        }
                    }
                }
            }
        });

        WatcherHandle {
            task,
            _subscription: subscription,
        }
    }

    #[cfg(test)]
    pub(crate) fn settle_for_test(&self, count: usize, source: CountSource) {
        self.settle(CountSnapshot { count, source });
    }
}

/// Handle to a running watcher; stops it when dropped.
pub struct WatcherHandle {
    task: JoinHandle<()>,
    _subscription: Subscription,
}

impl WatcherHandle {
    /// Stop the watcher now.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
