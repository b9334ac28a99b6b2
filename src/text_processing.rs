//! # Text Processing Module
//!
//! Best-effort helpers for comparing free-text ingredient and inventory strings.
//!
//! ## Features
//!
//! - Leading-quantity extraction ("500g" -> 500, "2 cups" -> 2)
//! - Name normalization for fuzzy comparison (lowercase, trimmed)
//!
//! ## Limitations
//!
//! Units are never parsed or converted. "2 cups" and "2 g" both read as a
//! magnitude of 2, and "1/2 cup" reads as 1. Availability checks built on
//! these helpers compare bare magnitudes across whatever units the strings
//! happen to carry.

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

/// Magnitude assumed when a string carries no number at all
pub const DEFAULT_QUANTITY: f64 = 1.0;

// First integer or decimal token anywhere in the string
const NUMBER_PATTERN: &str = r"\d+(?:\.\d+)?";

lazy_static! {
    static ref NUMBER_REGEX: Regex =
        Regex::new(NUMBER_PATTERN).expect("Number pattern should be valid");
}

/// Extract the first numeric token from a quantity or ingredient string
///
/// Returns [`DEFAULT_QUANTITY`] when the string contains no digits.
///
/// # Examples
///
/// ```rust
/// use scandibox::text_processing::parse_leading_quantity;
///
/// assert_eq!(parse_leading_quantity("500g"), 500.0);
/// assert_eq!(parse_leading_quantity("2 cups flour"), 2.0);
/// assert_eq!(parse_leading_quantity("1.5 kg potatoes"), 1.5);
/// assert_eq!(parse_leading_quantity("a pinch of salt"), 1.0);
/// ```
pub fn parse_leading_quantity(text: &str) -> f64 {
    let quantity = NUMBER_REGEX
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(DEFAULT_QUANTITY);
    trace!("Parsed quantity {} from '{}'", quantity, text);
    quantity
}

/// Normalize a name for fuzzy comparison
///
/// Lowercases and trims surrounding whitespace. No stemming, plural handling
/// or punctuation stripping.
pub fn normalize_name(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_with_attached_unit() {
        assert_eq!(parse_leading_quantity("500g"), 500.0);
        assert_eq!(parse_leading_quantity("1L"), 1.0);
        assert_eq!(parse_leading_quantity("2L milk"), 2.0);
    }

    #[test]
    fn test_parse_quantity_decimal() {
        assert_eq!(parse_leading_quantity("0.25 kg butter"), 0.25);
        assert_eq!(parse_leading_quantity("1.5"), 1.5);
    }

    #[test]
    fn test_parse_quantity_takes_first_number_only() {
        assert_eq!(parse_leading_quantity("eggs, 3 or 4"), 3.0);
        assert_eq!(parse_leading_quantity("2 x 400g cans tomatoes"), 2.0);
    }

    #[test]
    fn test_parse_quantity_defaults_to_one() {
        assert_eq!(parse_leading_quantity(""), DEFAULT_QUANTITY);
        assert_eq!(parse_leading_quantity("salt to taste"), DEFAULT_QUANTITY);
    }

    #[test]
    fn test_parse_quantity_ignores_units() {
        // Pinned behavior: magnitudes are compared without unit conversion
        assert_eq!(parse_leading_quantity("2 cups"), parse_leading_quantity("2 g"));
        assert_eq!(parse_leading_quantity("1 kg"), parse_leading_quantity("1 g"));
    }

    #[test]
    fn test_parse_quantity_fraction_reads_numerator() {
        assert_eq!(parse_leading_quantity("1/2 cup sugar"), 1.0);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Almond Milk "), "almond milk");
        assert_eq!(normalize_name("EGGS"), "eggs");
        assert_eq!(normalize_name("Crème fraîche"), "crème fraîche");
        // Punctuation is kept
        assert_eq!(normalize_name("Salt, coarse."), "salt, coarse.");
    }
}
