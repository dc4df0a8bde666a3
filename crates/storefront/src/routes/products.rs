//! Product route handlers.
//!
//! The listing is driven entirely by its query string: every request parses
//! a `ListingState`, redirects to the canonical URL when the query is not in
//! canonical form, and renders the page the API returns.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use redseam_core::ProductId;
use redseam_core::cart::MAX_SELECTABLE_QUANTITY;
use redseam_core::listing::{ListingState, SortOrder, parse_price_bound};
use redseam_core::pagination::{PageItem, page_items, result_range};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::form_urlencoded;

use crate::api::{AddToCartOutcome, AddToCartRequest, ApiError, Product, ProductPage};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, set_flash};
use crate::models::Flash;
use crate::routes::{Layout, PRODUCTS_PATH};
use crate::state::AppState;

/// Message shown when a product cannot be loaded.
pub const PRODUCT_NOT_FOUND: &str = "Product not found or error occurred.";

/// Message shown when the listing cannot be loaded.
const LISTING_FAILED: &str = "Error loading products";

// =============================================================================
// Listing Views
// =============================================================================

/// Product card on the listing page.
#[derive(Clone)]
pub struct ProductCard {
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub href: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.display(),
            image: product.card_image().map(String::from),
            href: format!("{PRODUCTS_PATH}/{}", product.id),
        }
    }
}

/// One slot in the page bar. `href` is `None` for ellipses.
#[derive(Clone)]
pub struct PageButton {
    pub label: String,
    pub href: Option<String>,
    pub active: bool,
}

/// Page bar with Previous/Next links.
#[derive(Clone)]
pub struct PaginationView {
    pub previous: Option<String>,
    pub next: Option<String>,
    pub pages: Vec<PageButton>,
}

impl PaginationView {
    fn build(listing: &ListingState, page: &ProductPage, window: u32) -> Self {
        let href = |number: u32| listing.with_page(number).href(PRODUCTS_PATH);

        let pages = page_items(page.meta.current_page, page.meta.last_page, window)
            .into_iter()
            .map(|item| match item {
                PageItem::Page { number, active } => PageButton {
                    label: number.to_string(),
                    href: Some(href(number)),
                    active,
                },
                PageItem::Ellipsis => PageButton {
                    label: "...".to_string(),
                    href: None,
                    active: false,
                },
            })
            .collect();

        Self {
            previous: page.meta.previous_page().map(href),
            next: page.meta.next_page().map(href),
            pages,
        }
    }
}

/// Entry of the sort dropdown.
#[derive(Clone)]
pub struct SortChoice {
    pub label: &'static str,
    pub href: String,
    pub selected: bool,
}

/// Active price filter chip.
#[derive(Clone)]
pub struct PriceChip {
    pub label: String,
    pub clear_href: String,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub result_count: String,
    pub pagination: Option<PaginationView>,
    pub sort_label: &'static str,
    pub sort_choices: Vec<SortChoice>,
    /// Query string of the listing the filter form was rendered on.
    pub current_query: String,
    pub price_from: String,
    pub price_to: String,
    pub price_chip: Option<PriceChip>,
}

impl ProductsIndexTemplate {
    fn new(layout: Layout, listing: &ListingState) -> Self {
        let sort_choices = SortOrder::ALL
            .into_iter()
            .map(|sort| SortChoice {
                label: sort.label(),
                href: listing.with_sort(Some(sort)).href(PRODUCTS_PATH),
                selected: listing.sort == Some(sort),
            })
            .collect();

        let price_chip = listing.has_price_filter().then(|| PriceChip {
            label: listing.price_range_label(),
            clear_href: listing.without_price_filter().href(PRODUCTS_PATH),
        });

        Self {
            layout,
            products: Vec::new(),
            result_count: LISTING_FAILED.to_string(),
            pagination: None,
            sort_label: listing.sort_label(),
            sort_choices,
            current_query: listing.to_query(),
            price_from: listing.price_from.map(|p| p.to_string()).unwrap_or_default(),
            price_to: listing.price_to.map(|p| p.to_string()).unwrap_or_default(),
            price_chip,
        }
    }
}

// =============================================================================
// Detail Views
// =============================================================================

/// Color swatch on the detail page.
#[derive(Clone)]
pub struct ColorOption {
    pub name: String,
    pub href: String,
    pub selected: bool,
}

/// Size choice on the detail page.
#[derive(Clone)]
pub struct SizeOption {
    pub name: String,
    pub selected: bool,
}

/// Thumbnail image; clicking it selects the color at the same index.
#[derive(Clone)]
pub struct Thumbnail {
    pub url: String,
    pub href: Option<String>,
    pub active: bool,
}

/// Product display data for the detail page.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub description: Option<String>,
    pub release_year: Option<String>,
    pub brand_name: Option<String>,
    pub brand_image: Option<String>,
    pub main_image: Option<String>,
    pub thumbnails: Vec<Thumbnail>,
    pub colors: Vec<ColorOption>,
    pub selected_color: Option<String>,
    pub sizes: Vec<SizeOption>,
    pub quantities: Vec<u32>,
    pub cart_action: String,
}

impl ProductDetailView {
    fn build(product: &Product, requested_color: Option<&str>) -> Self {
        let selected_color = product.resolve_color(requested_color).map(String::from);
        let selected_size = product.resolve_size(None);
        let main_image = product
            .image_for_color(selected_color.as_deref())
            .map(String::from);

        let colors = product
            .available_colors
            .iter()
            .map(|color| ColorOption {
                name: color.clone(),
                href: color_href(product.id, color),
                selected: selected_color.as_deref() == Some(color.as_str()),
            })
            .collect();

        let sizes = product
            .available_sizes
            .iter()
            .map(|size| SizeOption {
                name: size.clone(),
                selected: selected_size == Some(size.as_str()),
            })
            .collect();

        let thumbnails = product
            .images
            .iter()
            .enumerate()
            .map(|(index, url)| Thumbnail {
                url: url.clone(),
                href: product
                    .available_colors
                    .get(index)
                    .map(|color| color_href(product.id, color)),
                active: main_image.as_deref() == Some(url.as_str()),
            })
            .collect();

        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price.display(),
            description: product.description.clone(),
            release_year: product.release_year.clone(),
            brand_name: product.brand.as_ref().map(|b| b.name.clone()),
            brand_image: product.brand.as_ref().and_then(|b| b.image.clone()),
            main_image,
            thumbnails,
            colors,
            selected_color,
            sizes,
            quantities: (1..=MAX_SELECTABLE_QUANTITY).collect(),
            cart_action: format!("{PRODUCTS_PATH}/{}/cart", product.id),
        }
    }
}

fn color_href(id: ProductId, color: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("color", color)
        .finish();
    format!("{PRODUCTS_PATH}/{id}?{query}")
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetailView,
}

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub layout: Layout,
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display product listing page.
#[instrument(skip(state, auth, session))]
pub async fn index(
    State(state): State<AppState>,
    auth: OptionalAuth,
    session: Session,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    let raw = query.unwrap_or_default();
    let listing = ListingState::from_query(&raw);

    if let Err(e) = listing.validate() {
        set_flash(&session, Flash::error(e.to_string())).await?;
        return Ok(Redirect::to(&listing.without_price_filter().href(PRODUCTS_PATH)).into_response());
    }

    if raw != listing.to_query() {
        return Ok(Redirect::to(&listing.href(PRODUCTS_PATH)).into_response());
    }

    let layout = Layout::load(&auth, &session).await;
    let mut template = ProductsIndexTemplate::new(layout, &listing);

    let page = match state.api().list_products(&listing).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load product listing");
            return Ok(template.into_response());
        }
    };

    // The API decides which page it actually served; move the URL there.
    let last_page = page.meta.last_page.max(1);
    let served = if listing.page > last_page {
        last_page
    } else {
        page.meta.current_page.max(1)
    };
    if served != listing.page {
        return Ok(Redirect::to(&listing.with_page(served).href(PRODUCTS_PATH)).into_response());
    }

    let (start, end) = result_range(page.meta.current_page, page.meta.per_page, page.meta.total);
    template.result_count = format!("Showing {start}\u{2013}{end} of {} results", page.meta.total);
    template.products = page.data.iter().map(ProductCard::from).collect();
    if last_page > 1 {
        template.pagination = Some(PaginationView::build(
            &listing,
            &page,
            state.config().pagination_window,
        ));
    }

    Ok(template.into_response())
}

/// Price filter form data.
///
/// `current` carries the query string of the listing the form was submitted
/// from, so a rejected range leaves that listing untouched.
#[derive(Debug, Default, Deserialize)]
pub struct PriceFilterForm {
    #[serde(default)]
    pub price_from: String,
    #[serde(default)]
    pub price_to: String,
    #[serde(default)]
    pub current: String,
}

/// Apply the price filter, returning to page 1 with the sort kept.
#[instrument(skip(session, form))]
pub async fn apply_price_filter(
    session: Session,
    Form(form): Form<PriceFilterForm>,
) -> Result<Redirect> {
    let current = ListingState::from_query(&form.current);

    match current.with_price_filter(
        parse_price_bound(&form.price_from),
        parse_price_bound(&form.price_to),
    ) {
        Ok(next) => Ok(Redirect::to(&next.href(PRODUCTS_PATH))),
        Err(e) => {
            set_flash(&session, Flash::error(e.to_string())).await?;
            Ok(Redirect::to(&current.href(PRODUCTS_PATH)))
        }
    }
}

/// Query parameters of the detail page.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    pub color: Option<String>,
}

/// Display product detail page.
#[instrument(skip(state, auth, session, query), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    session: Session,
    Path(id): Path<ProductId>,
    Query(query): Query<ShowQuery>,
) -> Response {
    let layout = Layout::load(&auth, &session).await;

    match state.api().get_product(id).await {
        Ok(product) => ProductShowTemplate {
            layout,
            product: ProductDetailView::build(&product, query.color.as_deref()),
        }
        .into_response(),
        Err(e) => {
            let status = if matches!(e, ApiError::NotFound(_)) {
                StatusCode::NOT_FOUND
            } else {
                tracing::error!(error = %e, "Failed to load product");
                StatusCode::BAD_GATEWAY
            };
            (
                status,
                ErrorTemplate {
                    layout,
                    message: PRODUCT_NOT_FOUND.to_string(),
                },
            )
                .into_response()
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Default, Deserialize)]
pub struct AddToCartForm {
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<String>,
}

impl AddToCartForm {
    /// Selected quantity, defaulting to 1 and kept within the dropdown range.
    fn quantity(&self) -> u32 {
        self.quantity
            .as_deref()
            .and_then(|q| q.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_SELECTABLE_QUANTITY)
    }
}

fn add_to_cart_error(err: &ApiError) -> String {
    let detail = match err {
        ApiError::Validation { .. } => err.to_string(),
        ApiError::Unauthorized(message)
        | ApiError::NotFound(message)
        | ApiError::Status { message, .. } => message.clone(),
        _ => "Failed to add product to cart.".to_string(),
    };
    format!("Error adding product to cart: {detail}")
}

/// Add the selected variant to the cart.
///
/// A new line returns to the listing; a merge into an existing line stays on
/// the product page.
#[instrument(skip(state, auth, session, form), fields(product_id = %id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    auth: OptionalAuth,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let Some(token) = auth.token else {
        set_flash(
            &session,
            Flash::error("You must be logged in to add items to cart."),
        )
        .await?;
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let product = match state.api().get_product(id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(error = %e, "Product lookup failed before add to cart");
            set_flash(&session, Flash::error(PRODUCT_NOT_FOUND)).await?;
            return Ok(Redirect::to(PRODUCTS_PATH).into_response());
        }
    };

    let color = product.resolve_color(form.color.as_deref()).map(String::from);
    let request = AddToCartRequest {
        size: product.resolve_size(form.size.as_deref()).map(String::from),
        quantity: form.quantity(),
        color: color.clone(),
    };
    let product_href = color.as_deref().map_or_else(
        || format!("{PRODUCTS_PATH}/{id}"),
        |c| color_href(id, c),
    );

    let product_id = id.to_string();
    let quantity = request.quantity.to_string();
    add_breadcrumb(
        "cart",
        "Add to cart",
        Some(&[
            ("product_id", product_id.as_str()),
            ("quantity", quantity.as_str()),
        ]),
    );

    let (flash, target) = match state.api().add_to_cart(&token, id, &request).await {
        Ok(AddToCartOutcome::Added) => (
            Flash::success("Product added to cart successfully!"),
            PRODUCTS_PATH.to_string(),
        ),
        Ok(AddToCartOutcome::Merged) => (
            Flash::success("Updated quantity in cart successfully!"),
            product_href,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Add to cart failed");
            (Flash::error(add_to_cart_error(&e)), product_href)
        }
    };

    set_flash(&session, flash).await?;
    Ok(Redirect::to(&target).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::FieldErrors;

    fn product() -> Product {
        serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "kids sweater",
            "price": 80,
            "cover_image": "https://img/cover.png",
            "images": ["https://img/red.png", "https://img/blue.png", "https://img/extra.png"],
            "available_colors": ["Red", "Navy Blue"],
            "available_sizes": ["S", "M"],
            "brand": { "id": 1, "name": "Nike" }
        }))
        .unwrap()
    }

    #[test]
    fn test_detail_view_selects_requested_color() {
        let view = ProductDetailView::build(&product(), Some("navy blue"));
        assert_eq!(view.selected_color.as_deref(), Some("Navy Blue"));
        assert_eq!(view.main_image.as_deref(), Some("https://img/blue.png"));
        assert!(view.colors[1].selected);
        assert!(view.sizes[0].selected);
        assert_eq!(view.quantities.len(), 10);
        assert_eq!(view.cart_action, "/products/4/cart");
    }

    #[test]
    fn test_detail_view_thumbnails_link_colors() {
        let view = ProductDetailView::build(&product(), None);
        assert_eq!(view.thumbnails[0].href.as_deref(), Some("/products/4?color=Red"));
        assert_eq!(
            view.thumbnails[1].href.as_deref(),
            Some("/products/4?color=Navy+Blue")
        );
        assert!(view.thumbnails[2].href.is_none());
        assert!(view.thumbnails[0].active);
    }

    #[test]
    fn test_detail_view_without_options() {
        let bare: Product =
            serde_json::from_value(serde_json::json!({ "id": 1, "name": "x", "price": 1 })).unwrap();
        let view = ProductDetailView::build(&bare, Some("Red"));
        assert!(view.colors.is_empty());
        assert!(view.sizes.is_empty());
        assert!(view.selected_color.is_none());
        assert!(view.main_image.is_none());
    }

    #[test]
    fn test_add_to_cart_form_quantity() {
        let form = |q: &str| AddToCartForm {
            quantity: Some(q.to_string()),
            ..AddToCartForm::default()
        };
        assert_eq!(AddToCartForm::default().quantity(), 1);
        assert_eq!(form("3").quantity(), 3);
        assert_eq!(form("0").quantity(), 1);
        assert_eq!(form("25").quantity(), 10);
        assert_eq!(form("abc").quantity(), 1);
    }

    #[test]
    fn test_add_to_cart_error_messages() {
        let not_found = ApiError::Validation {
            message: "Item not found in cart for update.".to_string(),
            errors: FieldErrors::new(),
        };
        assert_eq!(
            add_to_cart_error(&not_found),
            "Error adding product to cart: Validation error: Item not found in cart for update."
        );

        let status = ApiError::Status {
            status: 500,
            message: "Server Error".to_string(),
        };
        assert_eq!(
            add_to_cart_error(&status),
            "Error adding product to cart: Server Error"
        );

        assert_eq!(
            add_to_cart_error(&ApiError::InvalidQuantity),
            "Error adding product to cart: Failed to add product to cart."
        );
    }

    #[test]
    fn test_pagination_view_links() {
        let page: ProductPage = serde_json::from_value(serde_json::json!({
            "data": [],
            "meta": {
                "current_page": 5, "last_page": 10, "per_page": 10, "total": 100,
                "links": [
                    { "url": "https://api/products?page=4", "label": "&laquo; Previous", "active": false },
                    { "url": "https://api/products?page=6", "label": "Next &raquo;", "active": false }
                ]
            }
        }))
        .unwrap();
        let listing = ListingState::from_query("page=5&sort=price");
        let view = PaginationView::build(&listing, &page, 2);

        assert_eq!(view.previous.as_deref(), Some("/products?page=4&sort=price"));
        assert_eq!(view.next.as_deref(), Some("/products?page=6&sort=price"));
        let labels: Vec<_> = view.pages.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["1", "...", "4", "5", "6", "...", "10"]);
        assert!(view.pages.iter().filter(|p| p.active).count() == 1);
        assert_eq!(view.pages[0].href.as_deref(), Some("/products?sort=price"));
    }

    #[test]
    fn test_index_template_sort_and_price_chip() {
        let listing = ListingState::from_query("price_from=10&sort=-price");
        let template = ProductsIndexTemplate::new(
            Layout {
                logged_in: false,
                avatar: String::new(),
                user_name: String::new(),
                flash: None,
            },
            &listing,
        );
        assert_eq!(template.sort_label, "Price, high to low");
        assert!(template.sort_choices[2].selected);
        assert_eq!(template.sort_choices[0].href, "/products?price_from=10&sort=created_at");
        let chip = template.price_chip.unwrap();
        assert_eq!(chip.label, "10 - \u{221e}");
        assert_eq!(chip.clear_href, "/products?sort=-price");
        assert_eq!(template.price_from, "10");
        assert_eq!(template.price_to, "");
        assert_eq!(template.current_query, "price_from=10&sort=-price");
    }
}
