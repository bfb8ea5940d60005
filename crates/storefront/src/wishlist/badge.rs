//! Wishlist badge display consumer.
//!
//! The badge keeps its own subscription to the change bus and its own view
//! of the local cache, independent of the reconciling counter. The rendered
//! value is the maximum of the two counts: a fresh optimistic cache write is
//! visible immediately even if the counter has not completed a remote fetch,
//! and a settled remote count is never dragged down by a stale cache. Biasing
//! toward over-counting is deliberate - an undercount is the worse defect
//! for this display.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::auth::Session;

use super::bus::{ChangeBus, Subscription};
use super::counter::WishlistCounter;
use super::store::WishlistCache;

/// A wishlist count display location (e.g. the navbar heart).
pub struct WishlistBadge {
    counter: WishlistCounter,
    local_count: Arc<AtomicUsize>,
    overflow: usize,
    _subscription: Subscription,
}

impl WishlistBadge {
    /// Create a badge and subscribe it to change notifications.
    ///
    /// `overflow` is the largest count rendered verbatim; anything above it
    /// shows as `"N+"`. The badge unsubscribes when dropped.
    #[must_use]
    pub fn new(
        session: Arc<dyn Session>,
        cache: WishlistCache,
        bus: &ChangeBus,
        counter: WishlistCounter,
        overflow: usize,
    ) -> Self {
        let local_count = Arc::new(AtomicUsize::new(local_count_for(
            session.as_ref(),
            &cache,
        )));

        let count_in_cb = Arc::clone(&local_count);
        let session_in_cb = Arc::clone(&session);
        let cache_in_cb = cache.clone();
        let subscription = bus.subscribe(move || {
            let count = local_count_for(session_in_cb.as_ref(), &cache_in_cb);
            count_in_cb.store(count, Ordering::SeqCst);
        });

        Self {
            counter,
            local_count,
            overflow,
            _subscription: subscription,
        }
    }

    /// The count this badge's own cache subscription has observed.
    #[must_use]
    pub fn local_count(&self) -> usize {
        self.local_count.load(Ordering::SeqCst)
    }

    /// The best-known count: `max(local, reconciled)`.
    #[must_use]
    pub fn display_count(&self) -> usize {
        self.local_count().max(self.counter.count())
    }

    /// Badge text, or `None` when the badge should be hidden.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        match self.display_count() {
            0 => None,
            n if n > self.overflow => Some(format!("{}+", self.overflow)),
            n => Some(n.to_string()),
        }
    }
}

/// Cache count for the active user; zero when signed out.
fn local_count_for(session: &dyn Session, cache: &WishlistCache) -> usize {
    session
        .current_user()
        .map_or(0, |user| cache.count(&user.email))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use secrecy::SecretString;

    use realm_wear_core::{Email, Price, ProductId, WishlistItem};

    use crate::api::ApiClient;
    use crate::auth::{AuthUser, SessionHandle};
    use crate::config::StorefrontConfig;
    use crate::wishlist::counter::CountSource;

    struct Fixture {
        session: SessionHandle,
        cache: WishlistCache,
        bus: ChangeBus,
        counter: WishlistCounter,
        email: Email,
    }

    fn fixture() -> Fixture {
        let config = StorefrontConfig {
            api_base_url: "http://127.0.0.1:1".parse().unwrap(),
            ..StorefrontConfig::default()
        };
        let session = SessionHandle::new();
        let email = Email::parse("shopper@example.com").unwrap();
        session.sign_in(
            AuthUser::from_email(email.clone()),
            SecretString::from("test-token"),
        );

        let api = ApiClient::new(&config, Arc::new(session.clone()));
        let cache = WishlistCache::in_memory();
        let bus = ChangeBus::new();
        let counter =
            WishlistCounter::new(api, Arc::new(session.clone()), cache.clone(), bus.clone());
        Fixture {
            session,
            cache,
            bus,
            counter,
            email,
        }
    }

    fn badge(f: &Fixture, overflow: usize) -> WishlistBadge {
        WishlistBadge::new(
            Arc::new(f.session.clone()),
            f.cache.clone(),
            &f.bus,
            f.counter.clone(),
            overflow,
        )
    }

    fn items(n: usize) -> Vec<WishlistItem> {
        (0..n)
            .map(|i| WishlistItem {
                product_id: ProductId::new(format!("p-{i}")),
                name: String::new(),
                price: Price::from_cents(100),
                added_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_display_count_is_max_of_both_sources() {
        let f = fixture();
        let b = badge(&f, 9);

        // local 3, remote 5 -> 5
        f.cache.put(&f.email, &items(3));
        f.bus.publish();
        f.counter.settle_for_test(5, CountSource::Remote);
        assert_eq!(b.local_count(), 3);
        assert_eq!(b.display_count(), 5);

        // local 7, remote 5 -> 7
        f.cache.put(&f.email, &items(7));
        f.bus.publish();
        assert_eq!(b.display_count(), 7);
    }

    #[test]
    fn test_local_count_tracks_cache_through_bus() {
        let f = fixture();
        let b = badge(&f, 9);
        assert_eq!(b.local_count(), 0);

        f.cache.put(&f.email, &items(2));
        // Not yet observed: no notification has fired.
        assert_eq!(b.local_count(), 0);

        f.bus.publish();
        assert_eq!(b.local_count(), 2);
    }

    #[test]
    fn test_badge_seeds_from_cache_on_creation() {
        let f = fixture();
        f.cache.put(&f.email, &items(4));
        let b = badge(&f, 9);
        assert_eq!(b.local_count(), 4);
    }

    #[test]
    fn test_label_hides_zero_and_caps_overflow() {
        let f = fixture();
        let b = badge(&f, 9);

        assert_eq!(b.label(), None);

        f.counter.settle_for_test(4, CountSource::Remote);
        assert_eq!(b.label(), Some("4".to_owned()));

        f.counter.settle_for_test(12, CountSource::Remote);
        assert_eq!(b.label(), Some("9+".to_owned()));
    }

    #[test]
    fn test_signed_out_badge_reads_zero() {
        let f = fixture();
        let b = badge(&f, 9);
        f.cache.put(&f.email, &items(3));
        f.session.sign_out();
        f.bus.publish();
        assert_eq!(b.local_count(), 0);
    }
}
