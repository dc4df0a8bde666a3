//! Cart arithmetic and line identity.
//!
//! The remote API owns the cart. This module only knows how to total the
//! lines it returns, how a quantity button changes the displayed quantity,
//! and how two lines are recognized as the same product variant.

use std::fmt;
use std::str::FromStr;

use crate::{Money, ProductId};

/// Flat delivery charge added to every order.
pub const DELIVERY_FEE: Money = Money::new(rust_decimal::Decimal::from_parts(5, 0, 0, false, 0));

/// Largest quantity offered by the quantity selector.
pub const MAX_SELECTABLE_QUANTITY: u32 = 10;

/// Placeholder used in line keys for a missing color or size.
const MISSING_PART: &str = "N/A";

/// Total for a single cart line.
///
/// The API's `total_price` wins when it is present and non-zero, otherwise
/// the line is priced as `price × quantity`.
#[must_use]
pub fn line_total(price: Money, quantity: u32, total_price: Option<Money>) -> Money {
    match total_price {
        Some(total) if !total.is_zero() => total,
        _ => price * quantity,
    }
}

/// Subtotal, delivery, and total of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    /// Sum of all line totals.
    pub subtotal: Money,
    /// Delivery charge.
    pub delivery: Money,
    /// `subtotal + delivery`.
    pub total: Money,
}

impl OrderSummary {
    /// Summarize an order from its line totals.
    #[must_use]
    pub fn from_line_totals(lines: impl IntoIterator<Item = Money>) -> Self {
        let subtotal: Money = lines.into_iter().sum();
        Self {
            subtotal,
            delivery: DELIVERY_FEE,
            total: subtotal + DELIVERY_FEE,
        }
    }
}

/// A quantity button on a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAction {
    /// The "+" button.
    Increase,
    /// The "−" button.
    Decrease,
}

impl FromStr for QuantityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            other => Err(format!("invalid quantity action: {other}")),
        }
    }
}

/// New quantity after pressing a button on a line showing `displayed`.
///
/// Returns `None` when nothing should be sent to the API: decreasing a line
/// that is already at 1 does nothing.
#[must_use]
pub const fn next_quantity(displayed: u32, action: QuantityAction) -> Option<u32> {
    match action {
        QuantityAction::Increase => Some(displayed.saturating_add(1)),
        QuantityAction::Decrease if displayed > 1 => Some(displayed - 1),
        QuantityAction::Decrease => None,
    }
}

/// Identity of a cart line: the product plus the chosen variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartKey {
    /// Product (and cart item) ID.
    pub id: ProductId,
    /// Chosen color, if any.
    pub color: Option<String>,
    /// Chosen size, if any.
    pub size: Option<String>,
}

impl CartKey {
    /// Create a key, treating blank color or size as missing.
    #[must_use]
    pub fn new(id: ProductId, color: Option<&str>, size: Option<&str>) -> Self {
        let clean = |part: Option<&str>| {
            part.map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
        };
        Self {
            id,
            color: clean(color),
            size: clean(size),
        }
    }

    /// Whether two keys name the same line. Color and size compare
    /// case-insensitively.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.id == other.id
            && eq_ignore_case(self.color.as_deref(), other.color.as_deref())
            && eq_ignore_case(self.size.as_deref(), other.size.as_deref())
    }
}

fn eq_ignore_case(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        (None, None) => true,
        _ => false,
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.id,
            self.color.as_deref().unwrap_or(MISSING_PART),
            self.size.as_deref().unwrap_or(MISSING_PART)
        )
    }
}
