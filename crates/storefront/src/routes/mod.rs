//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to the product listing
//!
//! # Products
//! GET  /products               - Product listing (page, price_from, price_to, sort)
//! POST /products/filter        - Apply a price filter to the listing
//! GET  /products/{id}          - Product detail (?color=)
//! POST /products/{id}/cart     - Add to cart
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart page
//! POST /cart/update            - Step a line's quantity up or down
//! POST /cart/remove            - Remove a line
//!
//! # Checkout
//! GET  /checkout               - Checkout form with order summary
//! POST /checkout               - Place the order
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action (multipart, optional avatar)
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::{OptionalAuth, take_flash};
use crate::models::Flash;
use crate::state::AppState;

/// Path of the product listing.
pub const PRODUCTS_PATH: &str = "/products";

/// Avatar shown when the user has none.
const DEFAULT_AVATAR: &str = "/static/images/user-icon.svg";

/// Header and flash data every page renders.
#[derive(Debug, Clone)]
pub struct Layout {
    pub logged_in: bool,
    pub avatar: String,
    pub user_name: String,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Build the layout for the current visitor, consuming any pending flash.
    pub async fn load(auth: &OptionalAuth, session: &Session) -> Self {
        let user = auth.user.as_ref();
        Self {
            logged_in: auth.is_logged_in(),
            avatar: user
                .and_then(|u| u.avatar.clone())
                .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            user_name: user.map_or("User", |u| u.display_name()).to_string(),
            flash: take_flash(session).await,
        }
    }
}

/// Root redirects to the listing.
pub async fn home() -> Redirect {
    Redirect::to(PRODUCTS_PATH)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/filter", post(products::apply_price_filter))
        .route("/{id}", get(products::show))
        .route("/{id}/cart", post(products::add_to_cart))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .nest("/auth", auth_routes())
}
