//! Realm Wear Storefront - client runtime.
//!
//! This library is the presentation-layer glue between the Realm Wear UI and
//! its two external collaborators: the identity provider (which owns login,
//! signup, and sessions) and the REST backend (which owns all durable state).
//!
//! # Architecture
//!
//! - [`config`] - environment-driven configuration
//! - [`auth`] - identity session boundary (current user + bearer credential)
//! - [`api`] - authenticated REST client with cached product reads
//! - [`wishlist`] - wishlist synchronization: local cache, change bus,
//!   reconciling counter, and the badge display consumer
//! - [`state`] - one-time wiring of the above into an [`state::AppState`]
//!
//! The wishlist subsystem keeps a per-user local cache as a fallback for the
//! remote wishlist store. Remote reads write through to the cache; remote
//! failures degrade to the cached value; change notifications fan out to
//! every subscriber, which re-query state themselves. Displayed counts take
//! the maximum of the two sources so a fresh optimistic local write never
//! flickers down to a stale remote number.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod config;
pub mod state;
pub mod wishlist;

pub use api::{ApiClient, ApiError, Product, WishlistEntry};
pub use auth::{AuthError, AuthUser, Session, SessionHandle};
pub use config::{ConfigError, StorefrontConfig};
pub use state::AppState;
pub use wishlist::{
    ChangeBus, CountSnapshot, CountSource, Subscription, WatcherHandle, WishlistBadge,
    WishlistCache, WishlistCounter, WishlistService,
};
