//! Client for the remote Redseam REST API.
//!
//! # Architecture
//!
//! - The remote API owns products, carts, and accounts; nothing is stored locally
//! - One typed method per endpoint, all going through one `send` path that maps error statuses
//! - Product and listing responses are cached via `moka` (TTL from config)
//! - Cart, auth, and checkout calls always hit the API
//!
//! # Example
//!
//! ```rust,ignore
//! use redseam_storefront::api::RedseamClient;
//!
//! let client = RedseamClient::new(&config.api)?;
//! let page = client.list_products(&ListingState::default()).await?;
//! let cart = client.get_cart(&token).await?;
//! ```

mod cache;
pub mod types;

pub use types::*;

use std::fmt;
use std::sync::Arc;

use moka::future::Cache;
use redseam_core::ProductId;
use redseam_core::cart::CartKey;
use redseam_core::checkout::CheckoutDetails;
use redseam_core::listing::ListingState;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the Redseam API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// 401: missing or rejected token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 404: no such resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 422: the API rejected the input.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: FieldErrors,
    },

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A cart quantity below 1 was about to be sent.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::Validation { .. } => Some(StatusCode::UNPROCESSABLE_ENTITY),
            Self::Status { status, .. } => StatusCode::from_u16(*status).ok(),
            Self::Http(e) => e.status(),
            Self::Parse(_) | Self::Url(_) | Self::InvalidQuantity => None,
        }
    }

    /// Message suitable for showing to the visitor.
    ///
    /// For API responses this is the server's `message`; otherwise the error
    /// itself.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Validation { message, .. }
            | Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// First validation message for `field`, if the API sent one.
    #[must_use]
    pub fn first_field_error(&self, field: &str) -> Option<&str> {
        match self {
            Self::Validation { errors, .. } => errors
                .get(field)
                .and_then(|messages| messages.first())
                .map(String::as_str),
            _ => None,
        }
    }

    /// Whether the request failed before any response arrived.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.status().is_none())
    }
}

/// Bearer token issued at login, read from the `authToken` cookie.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header and the cookie.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

// =============================================================================
// RedseamClient
// =============================================================================

/// Client for the Redseam REST API.
#[derive(Clone)]
pub struct RedseamClient {
    inner: Arc<RedseamClientInner>,
}

struct RedseamClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl RedseamClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(RedseamClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url, token: Option<&AuthToken>) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Send a request and return the body of a successful response.
    ///
    /// Non-success statuses are mapped onto [`ApiError`] using the API's
    /// `{ message, errors }` error body when present.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        tracing::warn!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Redseam API returned non-success status"
        );

        let error_body: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = error_body.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation {
                message,
                errors: error_body.errors.unwrap_or_default(),
            },
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Redseam API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of the product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, state: &ListingState) -> Result<ProductPage, ApiError> {
        let query = state.to_api_query();
        let cache_key = CacheKey::Products(query.clone());

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(*page);
        }

        let mut url = self.endpoint("products")?;
        url.set_query(Some(&query));

        let page: ProductPage = self.send_json(self.request(Method::GET, url, None)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Box::new(page.clone())))
            .await;

        Ok(page)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for unknown products, or another error
    /// if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("products/{id}"))?;
        let product: Product = self.send_json(self.request(Method::GET, url, None)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &AuthToken) -> Result<Vec<CartItem>, ApiError> {
        let url = self.endpoint("cart")?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// Add a product variant to the cart.
    ///
    /// When the API refuses with 422 because the variant is already in the
    /// cart, the existing line's quantity is raised by the requested amount
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the 422 cannot be resolved by a
    /// merge, or another error if any API request fails.
    #[instrument(skip(self, token, request), fields(product_id = %id))]
    pub async fn add_to_cart(
        &self,
        token: &AuthToken,
        id: ProductId,
        request: &AddToCartRequest,
    ) -> Result<AddToCartOutcome, ApiError> {
        let url = self.endpoint(&format!("cart/products/{id}"))?;

        match self
            .send(self.request(Method::POST, url, Some(token)).json(request))
            .await
        {
            Ok(_) => Ok(AddToCartOutcome::Added),
            Err(ApiError::Validation { message, .. }) => {
                debug!(%message, "Add rejected, merging into existing line");
                let wanted = CartKey::new(id, request.color.as_deref(), request.size.as_deref());
                let cart = self.get_cart(token).await?;
                let existing = cart
                    .iter()
                    .find(|item| item.key().matches(&wanted))
                    .ok_or_else(|| ApiError::Validation {
                        message: "Item not found in cart for update.".to_string(),
                        errors: FieldErrors::new(),
                    })?;

                self.update_cart_item(
                    token,
                    &existing.key(),
                    existing.quantity.saturating_add(request.quantity),
                )
                .await?;
                Ok(AddToCartOutcome::Merged)
            }
            Err(e) => Err(e),
        }
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidQuantity`] for a zero quantity (nothing is
    /// sent), or an error if the API request fails.
    #[instrument(skip(self, token), fields(key = %key))]
    pub async fn update_cart_item(
        &self,
        token: &AuthToken,
        key: &CartKey,
        quantity: u32,
    ) -> Result<(), ApiError> {
        if quantity == 0 {
            return Err(ApiError::InvalidQuantity);
        }

        let url = self.endpoint(&format!("cart/products/{}", key.id))?;
        let body = UpdateCartRequest {
            quantity,
            color: key.color.as_deref(),
            size: key.size.as_deref(),
        };
        self.send(self.request(Method::PATCH, url, Some(token)).json(&body))
            .await?;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(key = %key))]
    pub async fn remove_cart_item(&self, token: &AuthToken, key: &CartKey) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("cart/products/{}", key.id))?;
        let body = RemoveCartRequest {
            color: key.color.as_deref(),
            size: key.size.as_deref(),
        };
        self.send(self.request(Method::DELETE, url, Some(token)).json(&body))
            .await?;
        Ok(())
    }

    /// Place the order for the current cart.
    ///
    /// The details are sent as JSON first. If the API answers 400 or 422 the
    /// request is repeated once with no body and no `Content-Type`, and the
    /// outcome of that second attempt is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    #[instrument(skip(self, token, details))]
    pub async fn checkout(&self, token: &AuthToken, details: &CheckoutDetails) -> Result<(), ApiError> {
        let url = self.endpoint("cart/checkout")?;

        let first = self
            .send(self.request(Method::POST, url.clone(), Some(token)).json(details))
            .await;

        match first {
            Ok(_) => Ok(()),
            Err(e) if matches!(
                e.status(),
                Some(StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY)
            ) =>
            {
                tracing::warn!(error = %e, "Checkout rejected, retrying without a body");
                self.send(self.request(Method::POST, url, Some(token)))
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials,
    /// [`ApiError::Validation`] for invalid input, or another error if the
    /// API request fails.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("login")?;
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        self.send_json(self.request(Method::POST, url, None).json(&body))
            .await
    }

    /// Create an account. The form is sent as multipart so the avatar can
    /// travel with it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for rejected fields, or another error
    /// if the API request fails.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("register")?;

        let mut form = Form::new()
            .text("username", registration.username)
            .text("email", registration.email)
            .text("password", registration.password.expose_secret().to_string())
            .text(
                "password_confirmation",
                registration.password_confirmation.expose_secret().to_string(),
            );

        if let Some(avatar) = registration.avatar {
            let mut part = Part::bytes(avatar.bytes).file_name(avatar.file_name);
            if let Some(content_type) = avatar.content_type {
                part = part.mime_str(&content_type)?;
            }
            form = form.part("avatar", part);
        }

        self.send_json(self.request(Method::POST, url, None).multipart(form))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use redseam_core::checkout::CheckoutForm;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RedseamClient {
        let config = ApiConfig::with_base_url(&format!("{}/api", server.uri())).unwrap();
        RedseamClient::new(&config).unwrap()
    }

    fn token() -> AuthToken {
        AuthToken::new("secret-token")
    }

    fn product_json(id: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id, "name": "Hoodie", "price": 50,
            "available_colors": ["Red"], "available_sizes": ["L"]
        })
    }

    fn cart_line(id: i64, color: &str, size: &str, quantity: u32) -> serde_json::Value {
        serde_json::json!({
            "id": id, "name": "Hoodie", "price": 10, "quantity": quantity,
            "color": color, "size": size
        })
    }

    fn details() -> CheckoutDetails {
        CheckoutForm {
            name: "Nino".to_string(),
            surname: "Beridze".to_string(),
            email: "nino@example.com".to_string(),
            address: "1 Rustaveli Ave".to_string(),
            zipcode: "0108".to_string(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_auth_token_debug_is_redacted() {
        assert_eq!(format!("{:?}", token()), "AuthToken([REDACTED])");
        assert_eq!(token().expose(), "secret-token");
    }

    #[test]
    fn test_error_helpers() {
        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), vec!["Taken".to_string(), "Bad".to_string()]);
        let err = ApiError::Validation {
            message: "Invalid".to_string(),
            errors,
        };
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert_eq!(err.first_field_error("email"), Some("Taken"));
        assert_eq!(err.first_field_error("password"), None);
        assert_eq!(err.message(), "Invalid");
        assert!(!err.is_network());
    }

    #[tokio::test]
    async fn test_list_products_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("page", "2"))
            .and(query_param("filter[price_from]", "10"))
            .and(query_param("sort", "-price"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [product_json(1)],
                "meta": { "current_page": 2, "last_page": 3, "per_page": 10, "total": 25, "links": [] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let state = ListingState::from_query("page=2&price_from=10&sort=-price");
        let page = client.list_products(&state).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.current_page, 2);

        // Second call is served from the cache.
        client.list_products(&state).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/99"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "message": "No query results" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .get_product(ProductId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "No query results"));
    }

    #[tokio::test]
    async fn test_get_cart_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([cart_line(1, "Red", "L", 2)])),
            )
            .mount(&server)
            .await;

        let cart = client(&server).get_cart(&token()).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_get_cart_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "message": "Unauthenticated."
            })))
            .mount(&server)
            .await;

        let err = client(&server).get_cart(&token()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_add_to_cart_added() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/products/1"))
            .and(body_json(serde_json::json!({ "color": "Red", "size": "L", "quantity": 2 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let request = AddToCartRequest {
            color: Some("Red".to_string()),
            size: Some("L".to_string()),
            quantity: 2,
        };
        let outcome = client(&server)
            .add_to_cart(&token(), ProductId::new(1), &request)
            .await
            .unwrap();
        assert_eq!(outcome, AddToCartOutcome::Added);
    }

    #[tokio::test]
    async fn test_add_to_cart_merges_on_422() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/products/1"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "message": "Product already in cart"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([cart_line(1, "red", "L", 2)])),
            )
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/cart/products/1"))
            .and(body_json(serde_json::json!({ "quantity": 5, "color": "red", "size": "L" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let request = AddToCartRequest {
            color: Some("Red".to_string()),
            size: Some("L".to_string()),
            quantity: 3,
        };
        let outcome = client(&server)
            .add_to_cart(&token(), ProductId::new(1), &request)
            .await
            .unwrap();
        assert_eq!(outcome, AddToCartOutcome::Merged);
    }

    #[tokio::test]
    async fn test_add_to_cart_422_without_existing_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/products/1"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "message": "Invalid size"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([cart_line(1, "Red", "S", 1)])),
            )
            .mount(&server)
            .await;

        let request = AddToCartRequest {
            color: Some("Red".to_string()),
            size: Some("XL".to_string()),
            quantity: 1,
        };
        let err = client(&server)
            .add_to_cart(&token(), ProductId::new(1), &request)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Item not found in cart for update.");
    }

    #[tokio::test]
    async fn test_update_cart_item_rejects_zero() {
        let server = MockServer::start().await;
        let key = CartKey::new(ProductId::new(1), Some("Red"), Some("L"));
        let err = client(&server)
            .update_cart_item(&token(), &key, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidQuantity));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_cart_item_sends_variant() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart/products/7"))
            .and(body_json(serde_json::json!({ "color": "Blue", "size": "M" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let key = CartKey::new(ProductId::new(7), Some("Blue"), Some("M"));
        client(&server)
            .remove_cart_item(&token(), &key)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_checkout_succeeds_first_time() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/checkout"))
            .and(body_json(serde_json::json!({
                "name": "Nino",
                "surname": "Beridze",
                "email": "nino@example.com",
                "zip_code": "0108",
                "address": "1 Rustaveli Ave"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Order placed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).checkout(&token(), &details()).await.unwrap();
    }

    #[tokio::test]
    async fn test_checkout_retries_once_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/checkout"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "message": "Unexpected fields"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/cart/checkout"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "message": "Cart is empty"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .checkout(&token(), &details())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Cart is empty");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].body.is_empty());
        assert!(requests[1].body.is_empty());
        assert!(requests[1].headers.get("content-type").is_none());
    }

    #[tokio::test]
    async fn test_checkout_does_not_retry_other_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/checkout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server)
            .checkout(&token(), &details())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_login_returns_token_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_json(serde_json::json!({ "email": "a@b.co", "password": "hunter22" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "tok",
                "user": { "id": 1, "username": "nino", "email": "a@b.co", "avatar": "https://img/a.png" }
            })))
            .mount(&server)
            .await;

        let auth = client(&server)
            .login("a@b.co", &SecretString::from("hunter22"))
            .await
            .unwrap();
        assert_eq!(auth.token, "tok");
        assert_eq!(auth.user.avatar.as_deref(), Some("https://img/a.png"));
    }

    #[tokio::test]
    async fn test_login_validation_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "message": "The email field must be a valid email address.",
                "errors": { "email": ["The email field must be a valid email address."] }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .login("nope", &SecretString::from("x"))
            .await
            .unwrap_err();
        assert_eq!(
            err.first_field_error("email"),
            Some("The email field must be a valid email address.")
        );
    }

    #[tokio::test]
    async fn test_register_sends_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "token": "fresh",
                "user": { "username": "nino" }
            })))
            .mount(&server)
            .await;

        let registration = Registration {
            username: "nino".to_string(),
            email: "nino@example.com".to_string(),
            password: SecretString::from("hunter22"),
            password_confirmation: SecretString::from("hunter22"),
            avatar: Some(AvatarUpload {
                file_name: "me.png".to_string(),
                content_type: Some("image/png".to_string()),
                bytes: vec![1, 2, 3],
            }),
        };
        let auth = client(&server).register(registration).await.unwrap();
        assert_eq!(auth.token, "fresh");

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"password_confirmation\""));
        assert!(body.contains("filename=\"me.png\""));
    }
}
