//! Cache types for product API responses.

use redseam_core::ProductId;

use super::types::{Product, ProductPage};

/// Cache key for product responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// A single product.
    Product(ProductId),
    /// A listing page, keyed by its API query string.
    Products(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Box<ProductPage>),
}
