//! Wire types for the backend REST API.
//!
//! The backend serves Mongo-shaped documents (`_id`, camelCase fields).
//! These types mirror the payloads exactly; normalization into the shared
//! [`WishlistItem`] shape happens in [`WishlistEntry::normalize`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use realm_wear_core::{Price, ProductId, WishlistItem};

/// A product document as served by `GET /api/products`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// An embedded product reference inside a wishlist entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRef {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
}

/// One element of the `GET /api/wishlist` response.
///
/// Older backend records carry a bare `productId` instead of the populated
/// `product` document; both forms are accepted.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    #[serde(default)]
    pub product: Option<ProductRef>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

impl WishlistEntry {
    /// Normalize a wire entry into the shared cache shape.
    ///
    /// Entries with no product reference at all cannot be identified and are
    /// dropped from the cached list; the reconciled count still reflects the
    /// raw response length.
    #[must_use]
    pub fn normalize(self) -> Option<WishlistItem> {
        let (product_id, name, price) = match self.product {
            Some(p) => (
                p.id,
                p.name.unwrap_or_default(),
                p.price.unwrap_or_else(|| Price::from_cents(0)),
            ),
            None => (self.product_id?, String::new(), Price::from_cents(0)),
        };
        Some(WishlistItem {
            product_id,
            name,
            price,
            added_at: self.added_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Body for `POST /api/wishlist`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddWishlistRequest<'a> {
    pub product_id: &'a ProductId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_populated_entry() {
        let entry: WishlistEntry = serde_json::from_str(
            r#"{
                "product": { "_id": "p-1", "name": "Linen Shirt", "price": 49.99 },
                "addedAt": "2026-03-01T12:00:00Z"
            }"#,
        )
        .unwrap();

        let item = entry.normalize().unwrap();
        assert_eq!(item.product_id.as_str(), "p-1");
        assert_eq!(item.name, "Linen Shirt");
        assert_eq!(format!("{}", item.price), "$49.99");
    }

    #[test]
    fn test_normalize_bare_product_id() {
        let entry: WishlistEntry =
            serde_json::from_str(r#"{ "productId": "p-2" }"#).unwrap();

        let item = entry.normalize().unwrap();
        assert_eq!(item.product_id.as_str(), "p-2");
        assert!(item.name.is_empty());
    }

    #[test]
    fn test_normalize_unidentifiable_entry_is_dropped() {
        let entry: WishlistEntry =
            serde_json::from_str(r#"{ "addedAt": "2026-03-01T12:00:00Z" }"#).unwrap();
        assert!(entry.normalize().is_none());
    }

    #[test]
    fn test_product_deserializes_mongo_shape() {
        let product: Product = serde_json::from_str(
            r#"{
                "_id": "66b2f1c9",
                "name": "Wool Coat",
                "price": 189,
                "category": "outerwear"
            }"#,
        )
        .unwrap();
        assert_eq!(product.id.as_str(), "66b2f1c9");
        assert_eq!(product.category.as_deref(), Some("outerwear"));
        assert!(product.image.is_none());
    }
}
