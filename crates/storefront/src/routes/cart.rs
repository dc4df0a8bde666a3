//! Cart route handlers.
//!
//! The cart lives in the remote API. Every change is a form POST carrying
//! the line's key and the quantity the page displayed; after the API call
//! the visitor is sent back to `/cart`, which refetches everything.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use redseam_core::ProductId;
use redseam_core::cart::{CartKey, OrderSummary, QuantityAction, next_quantity};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::CartItem;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, set_flash};
use crate::models::Flash;
use crate::routes::{Layout, PRODUCTS_PATH};
use crate::state::AppState;

/// Path of the cart page.
pub const CART_PATH: &str = "/cart";

const UPDATE_FAILED: &str = "Failed to update quantity. Please try again.";
const REMOVE_FAILED: &str = "Failed to remove item. Please try again.";
const LOAD_FAILED: &str = "Failed to load cart items. Please try again.";

/// One cart line for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub href: String,
    /// Color as submitted back in forms; empty when the line has none.
    pub color: String,
    /// Size as submitted back in forms; empty when the line has none.
    pub size: String,
    pub quantity: u32,
    pub line_total: String,
    pub can_decrease: bool,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            image: item.image().map(String::from),
            href: format!("{PRODUCTS_PATH}/{}", item.id),
            color: item.color.clone().unwrap_or_default(),
            size: item.size.clone().unwrap_or_default(),
            quantity: item.quantity,
            line_total: item.line_total().display(),
            can_decrease: next_quantity(item.quantity, QuantityAction::Decrease).is_some(),
        }
    }
}

/// Order summary for templates.
#[derive(Clone)]
pub struct SummaryView {
    pub subtotal: String,
    pub delivery: String,
    pub total: String,
}

impl From<OrderSummary> for SummaryView {
    fn from(summary: OrderSummary) -> Self {
        Self {
            subtotal: summary.subtotal.display(),
            delivery: summary.delivery.display(),
            total: summary.total.display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    /// `None` for an empty cart, which shows the empty state instead.
    pub summary: Option<SummaryView>,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            item_count: 0,
            summary: None,
        }
    }

    /// Build the view from the API's cart lines.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        if items.is_empty() {
            return Self::empty();
        }

        let summary = OrderSummary::from_line_totals(items.iter().map(CartItem::line_total));
        Self {
            lines: items.iter().map(CartLineView::from).collect(),
            item_count: items.iter().map(|item| item.quantity).sum(),
            summary: Some(summary.into()),
        }
    }

    /// Whether there is nothing in the cart.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Heading of the cart panel.
    #[must_use]
    pub fn title(&self) -> String {
        format!("Shopping cart ({})", self.item_count)
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub error: Option<String>,
}

/// Form identifying a cart line.
#[derive(Debug, Deserialize)]
pub struct CartLineForm {
    pub id: ProductId,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl CartLineForm {
    fn key(&self) -> CartKey {
        CartKey::new(self.id, self.color.as_deref(), self.size.as_deref())
    }
}

/// Quantity button form: the line plus the quantity shown on the page.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: ProductId,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
    pub action: String,
}

impl UpdateCartForm {
    fn key(&self) -> CartKey {
        CartKey::new(self.id, self.color.as_deref(), self.size.as_deref())
    }
}

/// Display cart page.
#[instrument(skip(state, auth, session))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    session: Session,
) -> Result<Response> {
    let Some(token) = auth.token.clone() else {
        set_flash(
            &session,
            Flash::error("You must be logged in to view your cart"),
        )
        .await?;
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let layout = Layout::load(&auth, &session).await;
    let (cart, error) = match state.api().get_cart(&token).await {
        Ok(items) => (CartView::from_items(&items), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart");
            (CartView::empty(), Some(LOAD_FAILED.to_string()))
        }
    };

    Ok(CartShowTemplate {
        layout,
        cart,
        error,
    }
    .into_response())
}

/// Step a line's quantity up or down.
///
/// Decreasing a line shown at 1 sends nothing.
#[instrument(skip(state, token, session, form), fields(key = %form.key()))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth { token }: RequireAuth,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let action: QuantityAction = form.action.parse().map_err(AppError::BadRequest)?;

    let Some(quantity) = next_quantity(form.quantity, action) else {
        return Ok(Redirect::to(CART_PATH).into_response());
    };

    if let Err(e) = state
        .api()
        .update_cart_item(&token, &form.key(), quantity)
        .await
    {
        tracing::warn!(error = %e, quantity, "Failed to update cart quantity");
        set_flash(&session, Flash::error(UPDATE_FAILED)).await?;
    }

    Ok(Redirect::to(CART_PATH).into_response())
}

/// Remove a line from the cart.
#[instrument(skip(state, token, session, form), fields(key = %form.key()))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth { token }: RequireAuth,
    session: Session,
    Form(form): Form<CartLineForm>,
) -> Result<Response> {
    if let Err(e) = state.api().remove_cart_item(&token, &form.key()).await {
        tracing::warn!(error = %e, "Failed to remove cart item");
        set_flash(&session, Flash::error(REMOVE_FAILED)).await?;
    }

    Ok(Redirect::to(CART_PATH).into_response())
}
