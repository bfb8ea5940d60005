//! Application state shared across consumers.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::SessionHandle;
use crate::config::StorefrontConfig;
use crate::wishlist::{
    ChangeBus, JsonFileBackend, KeyValueBackend, MemoryBackend, WatcherHandle, WishlistBadge,
    WishlistCache, WishlistCounter, WishlistService,
};

/// The client runtime, wired once at application start.
///
/// Everything the UI consumes - session, API client, wishlist cache, change
/// bus, counter - is constructed here and injected by reference; none of it
/// is reachable as ambient global state. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    session: SessionHandle,
    api: ApiClient,
    cache: WishlistCache,
    bus: ChangeBus,
    counter: WishlistCounter,
    wishlist: WishlistService,
}

impl AppState {
    /// Wire up the client runtime from configuration.
    ///
    /// With `config.cache_path` set the wishlist cache is file-backed;
    /// otherwise it lives in memory for the life of the process.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let session = SessionHandle::new();
        let session_dyn: Arc<dyn crate::auth::Session> = Arc::new(session.clone());

        let api = ApiClient::new(&config, Arc::clone(&session_dyn));

        let backend: Arc<dyn KeyValueBackend> = match &config.cache_path {
            Some(path) => Arc::new(JsonFileBackend::open(path)),
            None => Arc::new(MemoryBackend::new()),
        };
        let cache = WishlistCache::new(backend);
        let bus = ChangeBus::new();

        let counter = WishlistCounter::new(
            api.clone(),
            Arc::clone(&session_dyn),
            cache.clone(),
            bus.clone(),
        );
        let wishlist = WishlistService::new(
            api.clone(),
            Arc::clone(&session_dyn),
            cache.clone(),
            bus.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                api,
                cache,
                bus,
                counter,
                wishlist,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the identity session handle.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the local wishlist cache.
    #[must_use]
    pub fn wishlist_cache(&self) -> &WishlistCache {
        &self.inner.cache
    }

    /// Get a reference to the change bus.
    #[must_use]
    pub fn change_bus(&self) -> &ChangeBus {
        &self.inner.bus
    }

    /// Get a reference to the reconciling counter.
    #[must_use]
    pub fn wishlist_counter(&self) -> &WishlistCounter {
        &self.inner.counter
    }

    /// Get a reference to the wishlist mutation service.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistService {
        &self.inner.wishlist
    }

    /// Start the reconciliation watcher with the configured poll interval.
    #[must_use = "dropping the handle stops the watcher"]
    pub fn spawn_wishlist_watcher(&self) -> WatcherHandle {
        self.inner
            .counter
            .spawn_watcher(self.inner.config.poll_interval)
    }

    /// Create a badge display consumer bound to this state's bus and cache.
    #[must_use]
    pub fn wishlist_badge(&self) -> WishlistBadge {
        WishlistBadge::new(
            Arc::new(self.inner.session.clone()),
            self.inner.cache.clone(),
            &self.inner.bus,
            self.inner.counter.clone(),
            self.inner.config.badge_overflow,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    use realm_wear_core::Email;

    use crate::auth::{AuthUser, Session};

    #[test]
    fn test_clones_share_state() {
        let state = AppState::new(StorefrontConfig::default());
        let clone = state.clone();

        let email = Email::parse("shopper@example.com").unwrap();
        state
            .session()
            .sign_in(AuthUser::from_email(email), SecretString::from("tok"));

        assert!(clone.session().current_user().is_some());
    }

    #[test]
    fn test_badge_sees_bus_publishes() {
        let state = AppState::new(StorefrontConfig::default());
        let email = Email::parse("shopper@example.com").unwrap();
        state
            .session()
            .sign_in(AuthUser::from_email(email.clone()), SecretString::from("tok"));

        let badge = state.wishlist_badge();
        assert_eq!(badge.local_count(), 0);

        let item = realm_wear_core::WishlistItem {
            product_id: realm_wear_core::ProductId::new("p-1"),
            name: "Linen Shirt".to_owned(),
            price: realm_wear_core::Price::from_cents(4999),
            added_at: chrono::Utc::now(),
        };
        state.wishlist_cache().put(&email, &[item]);
        state.change_bus().publish();
        assert_eq!(badge.local_count(), 1);
        assert_eq!(badge.display_count(), 1);
    }
}
