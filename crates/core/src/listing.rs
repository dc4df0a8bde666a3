//! Listing state and its query-string forms.
//!
//! The product listing is driven by four parameters: the page, an optional
//! price range, and an optional sort order. The same state has two textual
//! forms:
//!
//! - the storefront URL (`?page=2&price_from=10&sort=-price`), where default
//!   values are omitted so the default listing lives at a bare `/products`;
//! - the remote API query (`?page=2&filter[price_from]=10&sort=-price`), where
//!   the page is always sent.
//!
//! Parsing is lenient: anything that is not a usable value falls back to the
//! default, so every query string maps to some state. Serializing and parsing
//! again yields the same state.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;
use url::form_urlencoded;

/// Sort orders accepted by the products endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Newest products first (`created_at`).
    Newest,
    /// Cheapest first (`price`).
    PriceLowToHigh,
    /// Most expensive first (`-price`).
    PriceHighToLow,
}

impl SortOrder {
    /// Every sort order, in dropdown order.
    pub const ALL: [Self; 3] = [Self::Newest, Self::PriceLowToHigh, Self::PriceHighToLow];

    /// Query parameter value understood by the API.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Newest => "created_at",
            Self::PriceLowToHigh => "price",
            Self::PriceHighToLow => "-price",
        }
    }

    /// Human-readable dropdown label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "New products first",
            Self::PriceLowToHigh => "Price, low to high",
            Self::PriceHighToLow => "Price, high to low",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::Newest),
            "price" => Ok(Self::PriceLowToHigh),
            "-price" => Ok(Self::PriceHighToLow),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

/// Errors when applying a change to the listing state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    /// The minimum price is above the maximum price.
    #[error("Minimum price cannot be greater than maximum price.")]
    InvertedPriceRange,
}

/// Page, price filter, and sort of the product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingState {
    /// Current page (1-based).
    pub page: u32,
    /// Lower price bound, if filtering.
    pub price_from: Option<Decimal>,
    /// Upper price bound, if filtering.
    pub price_to: Option<Decimal>,
    /// Sort order, if any.
    pub sort: Option<SortOrder>,
}

impl Default for ListingState {
    fn default() -> Self {
        Self {
            page: 1,
            price_from: None,
            price_to: None,
            sort: None,
        }
    }
}

impl ListingState {
    /// Build the state from a storefront query string (without the leading `?`).
    ///
    /// The first occurrence of each parameter wins. Unusable values fall back
    /// to the defaults: `page` must be a positive integer, prices must be
    /// positive decimals, and `sort` must be a known order (`clear` means none).
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut page = None;
        let mut price_from = None;
        let mut price_to = None;
        let mut sort = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "page" => &mut page,
                "price_from" => &mut price_from,
                "price_to" => &mut price_to,
                "sort" => &mut sort,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        Self {
            page: page.as_deref().map_or(1, parse_page),
            price_from: price_from.as_deref().and_then(parse_price_bound),
            price_to: price_to.as_deref().and_then(parse_price_bound),
            sort: sort.as_deref().and_then(|s| s.trim().parse().ok()),
        }
    }

    /// Serialize to a storefront query string, omitting default values.
    ///
    /// The default state serializes to an empty string.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if self.page != 1 {
            query.append_pair("page", &self.page.to_string());
        }
        if let Some(from) = self.price_from {
            query.append_pair("price_from", &from.to_string());
        }
        if let Some(to) = self.price_to {
            query.append_pair("price_to", &to.to_string());
        }
        if let Some(sort) = self.sort {
            query.append_pair("sort", sort.as_param());
        }
        query.finish()
    }

    /// Serialize to the remote API's products query string.
    #[must_use]
    pub fn to_api_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", &self.page.to_string());
        if let Some(from) = self.price_from {
            query.append_pair("filter[price_from]", &from.to_string());
        }
        if let Some(to) = self.price_to {
            query.append_pair("filter[price_to]", &to.to_string());
        }
        if let Some(sort) = self.sort {
            query.append_pair("sort", sort.as_param());
        }
        query.finish()
    }

    /// Link to `path` carrying this state, e.g. `/products?page=2`.
    #[must_use]
    pub fn href(&self, path: &str) -> String {
        let query = self.to_query();
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        }
    }

    /// Check the price bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::InvertedPriceRange`] when both bounds are set
    /// and the lower one exceeds the upper one.
    pub fn validate(&self) -> Result<(), ListingError> {
        match (self.price_from, self.price_to) {
            (Some(from), Some(to)) if from > to => Err(ListingError::InvertedPriceRange),
            _ => Ok(()),
        }
    }

    /// Same filters, different page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Change the sort order and go back to the first page.
    #[must_use]
    pub fn with_sort(&self, sort: Option<SortOrder>) -> Self {
        Self {
            page: 1,
            sort,
            ..self.clone()
        }
    }

    /// Apply a price range and go back to the first page.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::InvertedPriceRange`] when `from > to`; the
    /// current state is left untouched.
    pub fn with_price_filter(
        &self,
        from: Option<Decimal>,
        to: Option<Decimal>,
    ) -> Result<Self, ListingError> {
        let next = Self {
            page: 1,
            price_from: from.filter(|p| p.is_sign_positive() && !p.is_zero()),
            price_to: to.filter(|p| p.is_sign_positive() && !p.is_zero()),
            sort: self.sort,
        };
        next.validate()?;
        Ok(next)
    }

    /// Drop the price range and go back to the first page.
    #[must_use]
    pub fn without_price_filter(&self) -> Self {
        Self {
            page: 1,
            price_from: None,
            price_to: None,
            sort: self.sort,
        }
    }

    /// Whether either price bound is set.
    #[must_use]
    pub const fn has_price_filter(&self) -> bool {
        self.price_from.is_some() || self.price_to.is_some()
    }

    /// Label for the active price chip, e.g. "10 - 50" or "0 - ∞".
    #[must_use]
    pub fn price_range_label(&self) -> String {
        let from = self
            .price_from
            .map_or_else(|| "0".to_string(), |p| p.to_string());
        let to = self
            .price_to
            .map_or_else(|| "\u{221e}".to_string(), |p| p.to_string());
        format!("{from} - {to}")
    }

    /// Label for the sort dropdown button.
    #[must_use]
    pub fn sort_label(&self) -> &'static str {
        self.sort.map_or("Sort by", SortOrder::label)
    }
}

fn parse_page(value: &str) -> u32 {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

/// Parse a positive price; zero, negatives, and malformed input mean "no bound".
#[must_use]
pub fn parse_price_bound(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim())
        .ok()
        .filter(|p| p.is_sign_positive() && !p.is_zero())
        .map(|p| p.normalize())
}
