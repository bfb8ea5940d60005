//! Wishlist change notifications.
//!
//! A [`ChangeBus`] is an explicitly constructed, injected service - one
//! instance per execution context, shared by reference, never a global.
//! Publishing carries no payload: subscribers re-query whatever state they
//! care about themselves.
//!
//! Delivery has two tiers:
//!
//! - same-context: registered callbacks run synchronously, in registration
//!   order, on the publishing task, with no coalescing of redundant publishes
//! - cross-context: a best-effort signal goes out on a shared broadcast
//!   channel so sibling contexts can bridge it into their own bus; if
//!   nobody is listening the signal is simply dropped

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::trace;

/// Capacity of the cross-context signal channel. Signals are valueless, so a
/// lagged receiver loses nothing it cannot recover by re-querying.
const CROSS_SIGNAL_CAPACITY: usize = 16;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Publish/subscribe registry for wishlist change notifications.
///
/// Cheap to clone; clones share the same subscriber set. Use
/// [`ChangeBus::sibling`] for a bus in another execution context that shares
/// only the cross-context channel.
#[derive(Clone)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    /// Registration-ordered subscriber list.
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_token: AtomicU64,
    /// Shared cross-context channel; messages carry the publishing bus's id
    /// so a bridge can skip its own signals.
    cross: broadcast::Sender<u64>,
    /// Identity of this bus on the cross-context channel.
    bus_id: u64,
}

static NEXT_BUS_ID: AtomicU64 = AtomicU64::new(1);

impl ChangeBus {
    /// Create a bus with its own cross-context channel.
    #[must_use]
    pub fn new() -> Self {
        let (cross, _) = broadcast::channel(CROSS_SIGNAL_CAPACITY);
        Self::with_channel(cross)
    }

    /// Create a bus in a sibling execution context: independent subscriber
    /// set, shared cross-context channel.
    #[must_use]
    pub fn sibling(&self) -> Self {
        Self::with_channel(self.inner.cross.clone())
    }

    fn with_channel(cross: broadcast::Sender<u64>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(Vec::new()),
                next_token: AtomicU64::new(1),
                cross,
                bus_id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
            }),
        }
    }

    /// Register a callback; it fires on every publish until the returned
    /// [`Subscription`] is dropped or explicitly unsubscribed.
    ///
    /// Multiple subscriptions from the same consumer are independent.
    #[must_use = "dropping the subscription unsubscribes the callback"]
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        let mut guard = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.push((token, Arc::new(callback)));
        Subscription {
            token,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Notify every subscriber that wishlist state may have changed.
    ///
    /// Callbacks run synchronously in registration order on the calling
    /// task. Redundant publishes are not deduplicated: each one triggers a
    /// full notification round. A cross-context signal is then sent
    /// best-effort; when the channel has no receivers the local delivery has
    /// already happened, which is the degraded mode the design accepts.
    pub fn publish(&self) {
        self.notify_local();
        let _ = self.inner.cross.send(self.inner.bus_id);
    }

    /// Invoke local subscribers only (no cross-context signal).
    fn notify_local(&self) {
        // Snapshot under the lock, invoke outside it, so a callback may
        // publish or (un)subscribe without deadlocking.
        let snapshot: Vec<Callback> = {
            let guard = self
                .inner
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        trace!(subscribers = snapshot.len(), "wishlist change notification");
        for callback in snapshot {
            callback();
        }
    }

    /// Forward cross-context signals from sibling buses into this bus's
    /// local subscribers.
    ///
    /// Signals published by this bus itself are skipped (its subscribers
    /// already ran synchronously). The bridge stops when the returned handle
    /// is dropped.
    #[must_use = "dropping the handle stops the bridge"]
    pub fn spawn_bridge(&self) -> BridgeHandle {
        let mut receiver = self.inner.cross.subscribe();
        let bus = self.clone();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(origin) if origin == bus.inner.bus_id => {}
                    Ok(_) => bus.notify_local(),
                    // Lagged: signals were dropped; one round covers them
                    // all since subscribers re-query state anyway.
                    Err(broadcast::error::RecvError::Lagged(_)) => bus.notify_local(),
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        BridgeHandle { task }
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability to deregister a bus callback.
///
/// Unsubscribes when dropped, so a consumer that goes away takes its
/// callback with it.
pub struct Subscription {
    token: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Deregister the callback now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            let mut guard = inner
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.retain(|(token, _)| *token != self.token);
        }
    }
}

/// Handle to a running cross-context bridge; aborts the task on drop.
pub struct BridgeHandle {
    task: JoinHandle<()>,
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_subscriber(bus: &ChangeBus) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in_cb = Arc::clone(&hits);
        let sub = bus.subscribe(move || {
            hits_in_cb.fetch_add(1, Ordering::SeqCst);
        });
        (hits, sub)
    }

    #[test]
    fn test_publish_invokes_subscriber_once() {
        let bus = ChangeBus::new();
        let (hits, sub) = counting_subscriber(&bus);

        bus.publish();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        bus.publish();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_redundant_publishes_are_not_coalesced() {
        let bus = ChangeBus::new();
        let (hits, _sub) = counting_subscriber(&bus);

        bus.publish();
        bus.publish();
        bus.publish();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_two_subscribers_and_partial_unsubscribe() {
        let bus = ChangeBus::new();
        let (hits_a, sub_a) = counting_subscriber(&bus);
        let (hits_b, _sub_b) = counting_subscriber(&bus);

        bus.publish();
        assert_eq!(hits_a.load(Ordering::SeqCst), 1);
        assert_eq!(hits_b.load(Ordering::SeqCst), 1);

        sub_a.unsubscribe();
        bus.publish();
        assert_eq!(hits_a.load(Ordering::SeqCst), 1);
        assert_eq!(hits_b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let bus = ChangeBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        let _first = bus.subscribe(move || o.lock().unwrap().push("first"));
        let o = Arc::clone(&order);
        let _second = bus.subscribe(move || o.lock().unwrap().push("second"));

        bus.publish();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let bus = ChangeBus::new();
        let (hits, sub) = counting_subscriber(&bus);
        drop(sub);
        bus.publish();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bridge_forwards_to_sibling_context() {
        let bus = ChangeBus::new();
        let sibling = bus.sibling();

        let (local_hits, _local_sub) = counting_subscriber(&bus);
        let (sibling_hits, _sibling_sub) = counting_subscriber(&sibling);
        let _bridge = sibling.spawn_bridge();

        // Give the bridge task a chance to subscribe before publishing.
        tokio::task::yield_now().await;
        bus.publish();

        // Local delivery is synchronous.
        assert_eq!(local_hits.load(Ordering::SeqCst), 1);

        // Cross-context delivery is asynchronous; wait for it.
        for _ in 0..50 {
            if sibling_hits.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sibling_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bridge_skips_own_publishes() {
        let bus = ChangeBus::new();
        let (hits, _sub) = counting_subscriber(&bus);
        let _bridge = bus.spawn_bridge();

        tokio::task::yield_now().await;
        bus.publish();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Exactly the synchronous delivery, no echo through the bridge.
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
