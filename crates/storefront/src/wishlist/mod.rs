//! Wishlist synchronization.
//!
//! Remote truth, local fallback, change notifications:
//!
//! - [`store::WishlistCache`] - per-user persisted item lists, overwritten on
//!   every successful remote fetch and read only when the remote is down
//! - [`bus::ChangeBus`] - valueless change notifications, synchronous
//!   in-context and best-effort cross-context
//! - [`counter::WishlistCounter`] - the reconciler: remote count when
//!   reachable, cached count otherwise, refreshed on mount/notification/poll
//! - [`service::WishlistService`] - mutations that write through optimistically
//!   and publish
//! - [`badge::WishlistBadge`] - a display location holding its own cache
//!   subscription and rendering `max(local, reconciled)`

pub mod badge;
pub mod bus;
pub mod counter;
pub mod service;
pub mod store;

pub use badge::WishlistBadge;
pub use bus::{BridgeHandle, ChangeBus, Subscription};
pub use counter::{CountSnapshot, CountSource, WatcherHandle, WishlistCounter};
pub use service::WishlistService;
pub use store::{JsonFileBackend, KeyValueBackend, MemoryBackend, WishlistCache};
