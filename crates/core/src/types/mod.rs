//! Core types for Realm Wear.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod wishlist;

pub use email::{Email, EmailError};
pub use id::ProductId;
pub use price::Price;
pub use wishlist::{WishlistItem, wishlist_cache_key};
