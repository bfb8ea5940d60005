//! Authenticated REST client for the Realm Wear backend.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; the backend is the source of truth
//! - Bearer credentials come from the injected [`Session`] on every request;
//!   the client never stores a token itself
//! - Product reads are cached in-memory via `moka` (5-minute TTL by default);
//!   wishlist reads are never cached here - the wishlist subsystem keeps its
//!   own per-user fallback store with different semantics

mod cache;
pub mod types;

pub use types::{Product, ProductRef, WishlistEntry};

use std::sync::Arc;

use moka::future::Cache;
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, instrument};

use realm_wear_core::ProductId;

use crate::auth::{AuthError, Session};
use crate::config::StorefrontConfig;

use cache::{CacheKey, CacheValue};
use types::AddWishlistRequest;

/// Most of an error body worth keeping in a log line.
const ERROR_BODY_SNIPPET: usize = 200;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No credential available for an authenticated endpoint.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Client for the Realm Wear backend REST API.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    session: Arc<dyn Session>,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new backend API client.
    #[must_use]
    pub fn new(config: &StorefrontConfig, session: Arc<dyn Session>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
                session,
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Attach the current user's bearer credential, failing when signed out.
    async fn authed(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let token = self.inner.session.bearer_token().await?;
        Ok(request.bearer_auth(token.expose_secret()))
    }

    /// Attach a bearer credential when one exists; anonymous otherwise.
    ///
    /// Product browsing works signed out, so a missing session is not an
    /// error here.
    async fn maybe_authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.inner.session.bearer_token().await {
            Ok(token) => request.bearer_auth(token.expose_secret()),
            Err(_) => request,
        }
    }

    /// Convert a non-success response into an [`ApiError::Status`].
    async fn status_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(ERROR_BODY_SNIPPET)
            .collect();
        ApiError::Status { status, message }
    }

    // =========================================================================
    // Wishlist Endpoints
    // =========================================================================

    /// Fetch the current user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error when no user is signed in, the request fails, the
    /// backend responds non-2xx, or the body is malformed. Callers in the
    /// wishlist subsystem treat every one of these the same way: fall back
    /// to the local cache.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self) -> Result<Vec<WishlistEntry>, ApiError> {
        let request = self.inner.client.get(self.endpoint("api/wishlist"));
        let response = self.authed(request).await?.send().await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                debug!(
                    error = %e,
                    body = %body.chars().take(ERROR_BODY_SNIPPET).collect::<String>(),
                    "malformed wishlist response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    /// Add a product to the current user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error when no user is signed in or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(&self, product_id: &ProductId) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("api/wishlist"))
            .json(&AddWishlistRequest { product_id });
        let response = self.authed(request).await?.send().await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    /// Remove a product from the current user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error when no user is signed in or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(&self, product_id: &ProductId) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint(&format!("api/wishlist/{product_id}")));
        let response = self.authed(request).await?.send().await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    // =========================================================================
    // Product Endpoints
    // =========================================================================

    /// Get the product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let request = self.inner.client.get(self.endpoint("api/products"));
        let response = self.maybe_authed(request).await.send().await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let products: Vec<Product> = serde_json::from_str(&response.text().await?)?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown product, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(product_id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self
            .inner
            .client
            .get(self.endpoint(&format!("api/products/{product_id}")));
        let response = self.maybe_authed(request).await.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(format!(
                "Product not found: {product_id}"
            )));
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let product: Product = serde_json::from_str(&response.text().await?)?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = StorefrontConfig::default();
        let client = ApiClient::new(&config, Arc::new(crate::auth::SessionHandle::new()));
        assert_eq!(
            client.endpoint("api/wishlist"),
            "http://localhost:5000/api/wishlist"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 401,
            message: "unauthorized".to_owned(),
        };
        assert_eq!(err.to_string(), "API error: 401 - unauthorized");

        let err = ApiError::NotFound("Product not found: p-1".to_owned());
        assert_eq!(err.to_string(), "Not found: Product not found: p-1");
    }
}
