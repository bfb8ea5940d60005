//! Per-user local wishlist cache.
//!
//! The cache is a fallback, not a source of truth: every successful remote
//! fetch overwrites it wholesale (write-through), and it is read only when
//! the remote store is unreachable. Nothing here ever raises to the caller -
//! an unreadable or unparseable entry degrades to an empty list, a failed
//! write degrades to a no-op, and both are logged so the decision stays
//! visible.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use realm_wear_core::{Email, WishlistItem, wishlist_cache_key};

/// Durable string-keyed storage the cache sits on.
///
/// The storefront runs against the origin-scoped key-value store; tests and
/// the library default use [`MemoryBackend`], the CLI uses
/// [`JsonFileBackend`]. Implementations never fail: a backend that cannot
/// read returns `None`, one that cannot write drops the value.
pub trait KeyValueBackend: Send + Sync {
    /// Read the raw value for a key.
    fn get(&self, key: &str) -> Option<String>;
    /// Overwrite the raw value for a key.
    fn set(&self, key: &str, value: String);
}

/// Process-local backend. The default for the library and for tests.
#[derive(Default)]
pub struct MemoryBackend {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.map.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut guard = self.map.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_owned(), value);
    }
}

/// File-backed backend: one JSON object mapping keys to raw values.
///
/// Loaded once at open; every write persists the whole map. Last writer
/// wins, which is fine for a cache.
pub struct JsonFileBackend {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
}

impl JsonFileBackend {
    /// Open (or start) the store at `path`.
    ///
    /// A missing or corrupt file starts the store empty rather than failing;
    /// the cache must stay usable without its durable layer.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            map: RwLock::new(map),
        }
    }

    fn persist(&self, map: &HashMap<String, String>) {
        match serde_json::to_string(map) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&self.path, raw) {
                    warn!(path = %self.path.display(), error = %e, "cache write failed");
                }
            }
            Err(e) => warn!(error = %e, "cache serialization failed"),
        }
    }
}

impl KeyValueBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.map.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        // Snapshot under the lock, write the file outside it: the disk write
        // must not stall readers on other tasks.
        let snapshot = {
            let mut guard = self.map.write().unwrap_or_else(PoisonError::into_inner);
            guard.insert(key.to_owned(), value);
            guard.clone()
        };
        self.persist(&snapshot);
    }
}

/// The per-user wishlist cache.
///
/// Keys are derived from the user's email via
/// [`wishlist_cache_key`]; values are the JSON-serialized item list.
/// Cheap to clone.
#[derive(Clone)]
pub struct WishlistCache {
    backend: Arc<dyn KeyValueBackend>,
}

impl WishlistCache {
    /// Create a cache over an explicit backend.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// Create a cache over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// The cached wishlist for `user`, in insertion order.
    ///
    /// Missing and unparseable entries both come back empty; the parse
    /// failure is logged but never surfaced.
    #[must_use]
    pub fn get(&self, user: &Email) -> Vec<WishlistItem> {
        let key = wishlist_cache_key(user);
        let Some(raw) = self.backend.get(&key) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(user = %user, error = %e, "cached wishlist unparseable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the cached wishlist for `user` entirely (no merge).
    pub fn put(&self, user: &Email, items: &[WishlistItem]) {
        let key = wishlist_cache_key(user);
        match serde_json::to_string(items) {
            Ok(raw) => self.backend.set(&key, raw),
            Err(e) => warn!(user = %user, error = %e, "wishlist cache write skipped"),
        }
    }

    /// Number of cached items for `user`.
    #[must_use]
    pub fn count(&self, user: &Email) -> usize {
        self.get(user).len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use realm_wear_core::{Price, ProductId};

    fn user() -> Email {
        Email::parse("shopper@example.com").unwrap()
    }

    fn item(id: &str) -> WishlistItem {
        WishlistItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_cents(1999),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_unseeded_store_counts_zero() {
        let cache = WishlistCache::in_memory();
        assert_eq!(cache.count(&user()), 0);
        assert!(cache.get(&user()).is_empty());
    }

    #[test]
    fn test_put_get_roundtrip_preserves_order() {
        let cache = WishlistCache::in_memory();
        let items = vec![item("p-1"), item("p-2"), item("p-3")];
        cache.put(&user(), &items);
        assert_eq!(cache.get(&user()), items);
        assert_eq!(cache.count(&user()), 3);
    }

    #[test]
    fn test_put_overwrites_not_merges() {
        let cache = WishlistCache::in_memory();
        cache.put(&user(), &[item("p-1"), item("p-2")]);
        cache.put(&user(), &[item("p-9")]);
        let items = cache.get(&user());
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().product_id.as_str(), "p-9");
    }

    #[test]
    fn test_unparseable_entry_degrades_to_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set(&wishlist_cache_key(&user()), "not json".to_owned());
        let cache = WishlistCache::new(backend);
        assert!(cache.get(&user()).is_empty());
        assert_eq!(cache.count(&user()), 0);
    }

    #[test]
    fn test_users_are_isolated() {
        let cache = WishlistCache::in_memory();
        let other = Email::parse("other@example.com").unwrap();
        cache.put(&user(), &[item("p-1")]);
        assert_eq!(cache.count(&user()), 1);
        assert_eq!(cache.count(&other), 0);
    }

    #[test]
    fn test_file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        {
            let cache = WishlistCache::new(Arc::new(JsonFileBackend::open(&path)));
            cache.put(&user(), &[item("p-1"), item("p-2")]);
        }

        let cache = WishlistCache::new(Arc::new(JsonFileBackend::open(&path)));
        assert_eq!(cache.count(&user()), 2);
    }

    #[test]
    fn test_file_backend_persists_every_key_across_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let other = Email::parse("other@example.com").unwrap();

        {
            let cache = WishlistCache::new(Arc::new(JsonFileBackend::open(&path)));
            cache.put(&user(), &[item("p-1")]);
            cache.put(&other, &[item("p-2"), item("p-3")]);
        }

        // Each write persists a full snapshot of the map, not just its key.
        let cache = WishlistCache::new(Arc::new(JsonFileBackend::open(&path)));
        assert_eq!(cache.count(&user()), 1);
        assert_eq!(cache.count(&other), 2);
    }

    #[test]
    fn test_file_backend_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{{{").unwrap();

        let cache = WishlistCache::new(Arc::new(JsonFileBackend::open(&path)));
        assert_eq!(cache.count(&user()), 0);
    }
}
