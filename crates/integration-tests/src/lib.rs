//! Integration test support for the Realm Wear client.
//!
//! Provides [`MockBackend`], an in-process stand-in for the external REST
//! backend: it serves the wishlist and product endpoints on an ephemeral
//! local port and can be flipped into failure modes so tests can exercise
//! the cache-fallback paths without real network faults.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p realm-wear-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test support code; panicking on broken fixtures is the point.
#![allow(clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Router, response::IntoResponse};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Shared state behind the mock routes.
#[derive(Clone, Default)]
struct BackendState {
    wishlist: Arc<Mutex<Vec<Value>>>,
    products: Arc<Mutex<Vec<Value>>>,
    fail_wishlist: Arc<AtomicBool>,
    malformed_wishlist: Arc<AtomicBool>,
    wishlist_hits: Arc<AtomicUsize>,
    product_hits: Arc<AtomicUsize>,
}

impl BackendState {
    fn wishlist_entries(&self) -> Vec<Value> {
        self.wishlist
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// An in-process mock of the external REST backend.
///
/// The server stops when the handle is dropped.
pub struct MockBackend {
    state: BackendState,
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind (test environment failure).
    pub async fn spawn() -> Self {
        let state = BackendState::default();

        let app = Router::new()
            .route("/api/wishlist", get(get_wishlist).post(add_wishlist))
            .route("/api/wishlist/{id}", axum::routing::delete(remove_wishlist))
            .route("/api/products", get(get_products))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend local addr");

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend serve");
        });

        Self { state, addr, task }
    }

    /// Base URL for client configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace the remote wishlist with entries for the given product ids.
    pub fn seed_wishlist(&self, product_ids: &[&str]) {
        let entries = product_ids
            .iter()
            .map(|id| {
                json!({
                    "product": { "_id": id, "name": format!("Product {id}"), "price": 19.99 },
                    "addedAt": "2026-03-01T12:00:00Z"
                })
            })
            .collect();
        *self
            .state
            .wishlist
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = entries;
    }

    /// Replace the product catalog.
    pub fn seed_products(&self, products: Vec<Value>) {
        *self
            .state
            .products
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = products;
    }

    /// Make `GET /api/wishlist` return 500 (when `fail` is true).
    pub fn fail_wishlist(&self, fail: bool) {
        self.state.fail_wishlist.store(fail, Ordering::SeqCst);
    }

    /// Make `GET /api/wishlist` return a non-JSON body (when true).
    pub fn malformed_wishlist(&self, malformed: bool) {
        self.state
            .malformed_wishlist
            .store(malformed, Ordering::SeqCst);
    }

    /// Number of `GET /api/wishlist` requests observed.
    #[must_use]
    pub fn wishlist_hits(&self) -> usize {
        self.state.wishlist_hits.load(Ordering::SeqCst)
    }

    /// Number of `GET /api/products` requests observed.
    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.state.product_hits.load(Ordering::SeqCst)
    }

    /// Current number of remote wishlist entries.
    #[must_use]
    pub fn wishlist_len(&self) -> usize {
        self.state.wishlist_entries().len()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn require_bearer(headers: &HeaderMap) -> Result<(), StatusCode> {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "));
    if authorized {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn get_wishlist(
    State(state): State<BackendState>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.wishlist_hits.fetch_add(1, Ordering::SeqCst);

    if state.fail_wishlist.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if let Err(status) = require_bearer(&headers) {
        return status.into_response();
    }
    if state.malformed_wishlist.load(Ordering::SeqCst) {
        return (StatusCode::OK, "definitely not json").into_response();
    }

    Json(Value::Array(state.wishlist_entries())).into_response()
}

async fn add_wishlist(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    if let Err(status) = require_bearer(&headers) {
        return status.into_response();
    }
    let Some(product_id) = body.get("productId").and_then(Value::as_str) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut wishlist = state
        .wishlist
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    wishlist.push(json!({
        "product": { "_id": product_id, "name": format!("Product {product_id}"), "price": 19.99 },
        "addedAt": "2026-03-01T12:00:00Z"
    }));

    StatusCode::CREATED.into_response()
}

async fn remove_wishlist(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(status) = require_bearer(&headers) {
        return status.into_response();
    }

    let mut wishlist = state
        .wishlist
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    wishlist.retain(|entry| {
        entry
            .pointer("/product/_id")
            .and_then(Value::as_str)
            .is_none_or(|pid| pid != id)
    });

    StatusCode::OK.into_response()
}

async fn get_products(State(state): State<BackendState>) -> Json<Value> {
    state.product_hits.fetch_add(1, Ordering::SeqCst);
    let products = state
        .products
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Json(Value::Array(products))
}
