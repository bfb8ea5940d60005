//! Wishlist line-item record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, Price, ProductId};

/// One entry in a user's wishlist.
///
/// Identity is `product_id`, unique within one user's wishlist. Entries keep
/// insertion order but the order carries no meaning. This is the normalized
/// shape shared by the local cache and the remote API layer; the raw wire
/// payload lives in the storefront crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Backend product identifier.
    pub product_id: ProductId,
    /// Product name at the time the item was added.
    pub name: String,
    /// Product price at the time the item was added.
    pub price: Price,
    /// When the user added the item.
    pub added_at: DateTime<Utc>,
}

/// Derive the per-user cache key for a wishlist.
///
/// Deterministic so that every component (cache writes, cache reads,
/// cross-context observers) lands on the same entry for a given user.
#[must_use]
pub fn wishlist_cache_key(user: &Email) -> String {
    format!("wishlist_{user}")
}
