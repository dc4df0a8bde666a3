//! Integration tests for the Redseam storefront.
//!
//! The full storefront router is driven in-process with
//! `tower::ServiceExt::oneshot`, while the remote Redseam API is replaced by a
//! `wiremock` server. No network access or running services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p redseam-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let app = TestApp::spawn().await;
//! Mock::given(method("GET"))
//!     .and(path("/api/products"))
//!     .respond_with(ResponseTemplate::new(200).set_body_json(product_page(&[], 1, 1)))
//!     .mount(&app.api)
//!     .await;
//!
//! let response = app.get("/products", &[]).await;
//! assert_eq!(response.status, StatusCode::OK);
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use redseam_storefront::app;
use redseam_storefront::config::{ApiConfig, StorefrontConfig};
use redseam_storefront::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

pub use redseam_storefront::middleware::AUTH_COOKIE;
pub use redseam_storefront::middleware::session::SESSION_COOKIE_NAME;

/// Largest response body the helpers will read.
const BODY_LIMIT: usize = 4 * 1024 * 1024;

/// A storefront router wired to a mock Redseam API.
pub struct TestApp {
    /// Mock of the remote API. Endpoints live under `/api`.
    pub api: MockServer,
    router: Router,
}

/// A fully read response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Target of a redirect response.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` pair of a cookie set by this response.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookie_header(name)
            .and_then(|value| value.split(';').next())
            .map(str::to_string)
    }

    /// Full `Set-Cookie` header for `name`, attributes included.
    #[must_use]
    pub fn set_cookie_header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}=");
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
    }
}

impl TestApp {
    /// Start a mock API and build the storefront router against it.
    pub async fn spawn() -> Self {
        let api = MockServer::start().await;

        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/static"),
            pagination_window: 2,
            api: ApiConfig::with_base_url(&format!("{}/api", api.uri()))
                .expect("mock server URL is valid"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let state = AppState::new(config).expect("Failed to build application state");
        Self {
            api,
            router: app::router(state),
        }
    }

    /// Send a request through the router and read the whole response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET path` with the given cookies (`name=value` pairs).
    pub async fn get(&self, path: &str, cookies: &[&str]) -> TestResponse {
        let request = with_cookies(Request::get(path), cookies)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// `POST path` with a url-encoded form body.
    pub async fn post_form(&self, path: &str, form: &str, cookies: &[&str]) -> TestResponse {
        let request = with_cookies(Request::post(path), cookies)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// `POST path` with a multipart body built by [`multipart_body`].
    pub async fn post_multipart(&self, path: &str, body: String, cookies: &[&str]) -> TestResponse {
        let request = with_cookies(Request::post(path), cookies)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Follow a redirect with the session cookie it set, so flashes show.
    pub async fn follow(&self, response: &TestResponse, cookies: &[&str]) -> TestResponse {
        let location = response.location().expect("response is a redirect");
        let session = response.cookie(SESSION_COOKIE_NAME);
        let mut all: Vec<&str> = cookies.to_vec();
        if let Some(session) = session.as_deref() {
            all.push(session);
        }
        self.get(location, &all).await
    }
}

fn with_cookies(
    builder: axum::http::request::Builder,
    cookies: &[&str],
) -> axum::http::request::Builder {
    if cookies.is_empty() {
        builder
    } else {
        builder.header(header::COOKIE, cookies.join("; "))
    }
}

/// Cookie pair for a logged-in visitor.
#[must_use]
pub fn auth_cookie(token: &str) -> String {
    format!("{AUTH_COOKIE}={token}")
}

/// Boundary used by [`multipart_body`].
pub const MULTIPART_BOUNDARY: &str = "redseam-test-boundary";

/// Build a multipart body from text fields and an optional file
/// (`name`, `file_name`, `content_type`, `bytes`).
#[must_use]
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &str)>) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some((name, file_name, content_type, bytes)) = file {
        body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{bytes}\r\n"
        ));
    }
    body.push_str(&format!("--{MULTIPART_BOUNDARY}--\r\n"));
    body
}

// =============================================================================
// API fixtures
// =============================================================================

/// A product record as the API returns it.
#[must_use]
pub fn product_json(id: i64, name: &str, price: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "A comfortable piece for everyday wear.",
        "price": price,
        "release_year": "2024",
        "cover_image": format!("https://img.example.com/{id}/cover.png"),
        "images": [
            format!("https://img.example.com/{id}/red.png"),
            format!("https://img.example.com/{id}/blue.png")
        ],
        "available_colors": ["Red", "Navy Blue"],
        "available_sizes": ["S", "M", "L"],
        "brand": { "id": 1, "name": "Nike", "image": "https://img.example.com/nike.png" }
    })
}

/// A listing page with Laravel-style pagination links.
#[must_use]
pub fn product_page(products: &[Value], current_page: u32, last_page: u32) -> Value {
    let per_page = 10_u32;
    let total = if products.is_empty() {
        0
    } else {
        u64::from(last_page - 1) * u64::from(per_page) + products.len() as u64
    };
    let link = |page: u32| format!("https://api.example.com/api/products?page={page}");

    let mut links = vec![json!({
        "url": (current_page > 1).then(|| link(current_page - 1)),
        "label": "&laquo; Previous",
        "active": false
    })];
    for page in 1..=last_page {
        links.push(json!({ "url": link(page), "label": page.to_string(), "active": page == current_page }));
    }
    links.push(json!({
        "url": (current_page < last_page).then(|| link(current_page + 1)),
        "label": "Next &raquo;",
        "active": false
    }));

    json!({
        "data": products,
        "meta": {
            "current_page": current_page,
            "last_page": last_page,
            "per_page": per_page,
            "total": total,
            "links": links
        }
    })
}

/// A cart line as the API returns it.
#[must_use]
pub fn cart_line(id: i64, price: u32, quantity: u32, color: &str, size: &str) -> Value {
    json!({
        "id": id,
        "name": format!("product {id}"),
        "price": price,
        "quantity": quantity,
        "color": color,
        "size": size,
        "total_price": price * quantity,
        "cover_image": format!("https://img.example.com/{id}/cover.png"),
        "images": [format!("https://img.example.com/{id}/red.png")],
        "available_colors": ["Red"]
    })
}
