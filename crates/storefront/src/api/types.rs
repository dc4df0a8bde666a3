//! Request and response types for the Redseam REST API.

use std::collections::BTreeMap;

use redseam_core::cart::{CartKey, line_total};
use redseam_core::{Money, ProductId};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::models::CurrentUser;

/// Field name to validation messages, as sent in 422 responses.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Error body the API sends with non-success responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<FieldErrors>,
}

/// Treat a JSON `null` list as empty.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Accept a string or a number, keeping it as text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Index of `wanted` in `options`, ignoring case.
fn position_ignore_case(options: &[String], wanted: &str) -> Option<usize> {
    let wanted = wanted.trim().to_lowercase();
    options.iter().position(|o| o.to_lowercase() == wanted)
}

// =============================================================================
// Products
// =============================================================================

/// Product brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default, deserialize_with = "lenient_string")]
    pub release_year: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub available_colors: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub available_sizes: Vec<String>,
    #[serde(default)]
    pub brand: Option<Brand>,
}

impl Product {
    /// The available color matching `requested` (ignoring case), or the first
    /// color when nothing matches.
    #[must_use]
    pub fn resolve_color(&self, requested: Option<&str>) -> Option<&str> {
        resolve_option(&self.available_colors, requested)
    }

    /// The available size matching `requested` (ignoring case), or the first
    /// size when nothing matches.
    #[must_use]
    pub fn resolve_size(&self, requested: Option<&str>) -> Option<&str> {
        resolve_option(&self.available_sizes, requested)
    }

    /// Image shown for a color: the image at the color's index, then the
    /// first image, then the cover image.
    #[must_use]
    pub fn image_for_color(&self, color: Option<&str>) -> Option<&str> {
        color
            .and_then(|c| position_ignore_case(&self.available_colors, c))
            .and_then(|i| self.images.get(i))
            .or_else(|| self.images.first())
            .map(String::as_str)
            .or(self.cover_image.as_deref())
    }

    /// Image for listing cards.
    #[must_use]
    pub fn card_image(&self) -> Option<&str> {
        self.cover_image
            .as_deref()
            .or_else(|| self.images.first().map(String::as_str))
    }
}

fn resolve_option<'a>(options: &'a [String], requested: Option<&str>) -> Option<&'a str> {
    requested
        .and_then(|r| position_ignore_case(options, r))
        .and_then(|i| options.get(i))
        .or_else(|| options.first())
        .map(String::as_str)
}

/// One entry of the API's pagination links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLink {
    #[serde(default)]
    pub url: Option<String>,
    pub label: String,
    #[serde(default)]
    pub active: bool,
}

impl PageLink {
    /// Page number carried by the link's `page` query parameter.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        let url = self.url.as_deref()?;
        let parsed = Url::parse(url)
            .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(url)))
            .ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    }
}

/// Pagination metadata of a product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub links: Vec<PageLink>,
}

impl PageMeta {
    /// Target page of the "Previous" link, if it is enabled.
    #[must_use]
    pub fn previous_page(&self) -> Option<u32> {
        self.nav_page("Previous")
    }

    /// Target page of the "Next" link, if it is enabled.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        self.nav_page("Next")
    }

    fn nav_page(&self, label: &str) -> Option<u32> {
        self.links
            .iter()
            .find(|link| link.label.contains(label))
            .and_then(PageLink::page)
    }
}

/// One page of the product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(deserialize_with = "nullable_vec")]
    pub data: Vec<Product>,
    pub meta: PageMeta,
}

// =============================================================================
// Cart
// =============================================================================

/// A line in the user's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub total_price: Option<Money>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub available_colors: Vec<String>,
}

impl CartItem {
    /// Identity of this line.
    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey::new(self.id, self.color.as_deref(), self.size.as_deref())
    }

    /// Total for this line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        line_total(self.price, self.quantity, self.total_price)
    }

    /// Image for the chosen color, falling back to the cover image.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.color
            .as_deref()
            .and_then(|c| position_ignore_case(&self.available_colors, c))
            .and_then(|i| self.images.get(i))
            .map(String::as_str)
            .or(self.cover_image.as_deref())
    }
}

/// Body of `POST /cart/products/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct AddToCartRequest {
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
}

/// Body of `PATCH /cart/products/{id}`. Missing variant parts are omitted.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCartRequest<'a> {
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'a str>,
}

/// Body of `DELETE /cart/products/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveCartRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'a str>,
}

/// How an add-to-cart request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddToCartOutcome {
    /// A new line was created.
    Added,
    /// The variant was already in the cart; its quantity was raised.
    Merged,
}

// =============================================================================
// Auth
// =============================================================================

/// Response of login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: CurrentUser,
}

/// Avatar file attached to a registration.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Registration form forwarded to `POST /register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: secrecy::SecretString,
    pub password_confirmation: secrecy::SecretString,
    pub avatar: Option<AvatarUpload>,
}
