//! Redseam Storefront library.
//!
//! This crate provides the storefront as a library so the router can be
//! driven in-process by tests. The binary in `main.rs` only adds process
//! setup (Sentry, tracing, listener, shutdown).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
