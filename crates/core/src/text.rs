//! Display-text helpers shared by templates.

/// Swatch color used when a color name is not recognized.
pub const FALLBACK_HEX: &str = "#808080";

/// Lowercase the text, then capitalize the first letter of each word.
///
/// ```
/// use redseam_core::text::capital_case;
///
/// assert_eq!(capital_case("NAVY blue"), "Navy Blue");
/// ```
#[must_use]
pub fn capital_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            at_word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Hex code for a product color name. Matching ignores case and surrounding
/// whitespace; unknown names get [`FALLBACK_HEX`].
#[must_use]
pub fn color_hex(name: &str) -> &'static str {
    match name.trim().to_lowercase().as_str() {
        "yellow" => "#FFFF00",
        "green" => "#00FF00",
        "purple" => "#800080",
        "pink" => "#FFC1CC",
        "white" => "#FFFFFF",
        "red" => "#FF0000",
        "blue" => "#0000FF",
        "navy blue" => "#000080",
        "black" => "#000000",
        "beige" => "#F5F5DC",
        "orange" => "#FFA500",
        _ => FALLBACK_HEX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capital_case() {
        assert_eq!(capital_case("kids sweater"), "Kids Sweater");
        assert_eq!(capital_case("  two  SPACES "), "  Two  Spaces ");
        assert_eq!(capital_case(""), "");
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(color_hex("Navy Blue"), "#000080");
        assert_eq!(color_hex("pink"), "#FFC1CC");
        assert_eq!(color_hex(" Beige "), "#F5F5DC");
    }

    #[test]
    fn test_unknown_and_grey_use_fallback() {
        assert_eq!(color_hex("grey"), FALLBACK_HEX);
        assert_eq!(color_hex("multi"), FALLBACK_HEX);
        assert_eq!(color_hex("chartreuse"), FALLBACK_HEX);
    }
}
