//! Wishlist mutations.
//!
//! The producer side of the change bus: add and remove go to the backend,
//! update the local cache optimistically, and then publish a change
//! notification so every badge and counter re-queries. The optimistic cache
//! write is what keeps the badge from flickering while the reconciler's next
//! remote fetch is still in flight.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use realm_wear_core::{ProductId, WishlistItem};

use crate::api::{ApiClient, ApiError, Product};
use crate::auth::Session;

use super::bus::ChangeBus;
use super::store::WishlistCache;

/// Add/remove operations over the remote wishlist.
#[derive(Clone)]
pub struct WishlistService {
    api: ApiClient,
    session: Arc<dyn Session>,
    cache: WishlistCache,
    bus: ChangeBus,
}

impl WishlistService {
    /// Create a service over the given collaborators.
    #[must_use]
    pub fn new(
        api: ApiClient,
        session: Arc<dyn Session>,
        cache: WishlistCache,
        bus: ChangeBus,
    ) -> Self {
        Self {
            api,
            session,
            cache,
            bus,
        }
    }

    /// Add a product to the current user's wishlist.
    ///
    /// On success the cached list gains the item (if not already present)
    /// and a change notification goes out.
    ///
    /// # Errors
    ///
    /// Returns an error when no user is signed in or the backend rejects
    /// the mutation; nothing is cached or published in that case.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product) -> Result<(), ApiError> {
        self.api.add_to_wishlist(&product.id).await?;

        if let Some(user) = self.session.current_user() {
            let mut items = self.cache.get(&user.email);
            if !items.iter().any(|i| i.product_id == product.id) {
                items.push(WishlistItem {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    price: product.price,
                    added_at: Utc::now(),
                });
                self.cache.put(&user.email, &items);
            }
        }

        self.bus.publish();
        Ok(())
    }

    /// Remove a product from the current user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error when no user is signed in or the backend rejects
    /// the mutation; nothing is cached or published in that case.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<(), ApiError> {
        self.api.remove_from_wishlist(product_id).await?;

        if let Some(user) = self.session.current_user() {
            let mut items = self.cache.get(&user.email);
            items.retain(|i| &i.product_id != product_id);
            self.cache.put(&user.email, &items);
        }

        self.bus.publish();
        Ok(())
    }

    /// Announce that wishlist state may have changed without mutating it.
    ///
    /// For callers that updated state through another path and only need the
    /// notification fan-out.
    pub fn notify_changed(&self) {
        self.bus.publish();
    }
}
