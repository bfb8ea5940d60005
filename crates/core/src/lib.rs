//! Realm Wear Core - Shared types library.
//!
//! This crate provides common types used across the Realm Wear client:
//! - `storefront` - Client runtime (API access, wishlist synchronization)
//! - `cli` - Command-line tools for inspecting the client state
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe emails, product IDs, and
//!   prices, plus the wishlist line-item record shared by the cache and the
//!   remote API layer.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
