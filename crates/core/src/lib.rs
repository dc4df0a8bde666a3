//! Redseam Core - Shared storefront logic.
//!
//! This crate provides the pieces of the storefront that do not talk to the
//! network or render HTML. It is used by:
//! - `storefront` - Server-rendered site that consumes the remote Redseam API
//! - `integration-tests` - End-to-end checks of the storefront router
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no templates. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, money, and emails
//! - [`pagination`] - Visible page window and page-button layout
//! - [`listing`] - Listing state (page, price filter, sort) and its query-string forms
//! - [`cart`] - Order summary totals and quantity stepping
//! - [`checkout`] - Checkout form validation
//! - [`text`] - Display helpers for product names and color swatches

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod listing;
pub mod pagination;
pub mod text;
pub mod types;

pub use types::*;
