//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use redseam_core::checkout::{CheckoutError, CheckoutForm};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{AuthToken, CartItem};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::Layout;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Fetch the cart lines. No token or a failed fetch both count as an empty
/// cart.
async fn load_cart(state: &AppState, token: Option<&AuthToken>) -> Vec<CartItem> {
    let Some(token) = token else {
        return Vec::new();
    };
    match state.api().get_cart(token).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart for checkout");
            Vec::new()
        }
    }
}

/// Run the checks in order, then submit the order.
///
/// Returns the message to show above the form when anything fails.
async fn place_order(
    state: &AppState,
    token: Option<&AuthToken>,
    form: &CheckoutForm,
    items: &[CartItem],
) -> Result<(), String> {
    let details = form.validate().map_err(|e| e.to_string())?;
    let token = token.ok_or_else(|| CheckoutError::NotLoggedIn.to_string())?;
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart.to_string());
    }

    state.api().checkout(token, &details).await.map_err(|e| {
        tracing::warn!(error = %e, "Checkout failed");
        format!("Checkout failed: {}", e.message())
    })
}

/// Display the checkout form with the order summary.
///
/// The email field starts with the logged-in user's email.
#[instrument(skip(state, auth, session))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    session: Session,
) -> Response {
    let items = load_cart(&state, auth.token.as_ref()).await;
    let form = CheckoutForm {
        email: auth
            .user
            .as_ref()
            .and_then(|u| u.email.clone())
            .unwrap_or_default(),
        ..CheckoutForm::default()
    };

    CheckoutTemplate {
        layout: Layout::load(&auth, &session).await,
        cart: CartView::from_items(&items),
        form,
        error: None,
    }
    .into_response()
}

/// Place the order.
///
/// On failure the form is shown again with the message and the submitted
/// values. On success the confirmation page shows the emptied cart.
#[instrument(skip(state, auth, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    auth: OptionalAuth,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let layout = Layout::load(&auth, &session).await;
    let items = load_cart(&state, auth.token.as_ref()).await;

    if let Err(message) = place_order(&state, auth.token.as_ref(), &form, &items).await {
        return CheckoutTemplate {
            layout,
            cart: CartView::from_items(&items),
            form,
            error: Some(message),
        }
        .into_response();
    }

    add_breadcrumb("checkout", "Order placed", None);
    tracing::info!(lines = items.len(), "Checkout completed");

    let items = load_cart(&state, auth.token.as_ref()).await;
    CheckoutSuccessTemplate {
        layout,
        cart: CartView::from_items(&items),
    }
    .into_response()
}
