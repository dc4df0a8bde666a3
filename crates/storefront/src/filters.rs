//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Lowercases the text and capitalizes each word.
///
/// Usage in templates: `{{ product.name|capital_case }}`
#[askama::filter_fn]
pub fn capital_case(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(redseam_core::text::capital_case(&value.to_string()))
}

/// Returns the swatch hex code for a color name.
///
/// Usage in templates: `{{ color|color_hex }}`
#[askama::filter_fn]
pub fn color_hex(value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(redseam_core::text::color_hex(&value.to_string()))
}

/// Returns the URL of the stylesheet.
///
/// The fingerprinted copy from the build script is preferred; without a hash
/// the plain `main.css` is linked.
///
/// Usage in templates: `{{ ""|stylesheet_href }}`
#[askama::filter_fn]
pub fn stylesheet_href(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(stylesheet_path(env!("CSS_HASH")))
}

fn stylesheet_path(hash: &str) -> String {
    if hash.is_empty() {
        "/static/css/main.css".to_string()
    } else {
        format!("/static/css/derived/main.{hash}.css")
    }
}
