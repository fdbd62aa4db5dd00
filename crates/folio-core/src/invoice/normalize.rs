//! Normalization of extracted invoice values.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::dates::{format_date, parse_any};
use crate::models::record::format_amount;

lazy_static! {
    static ref DASH_SPACING: Regex = Regex::new(r"\s*-\s*").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref AMOUNT_DIGITS: Regex = Regex::new(r"-?\d[\d,]*(?:\.\d+)?").unwrap();
}

/// Collapse spacing around dashes, then drop remaining whitespace.
///
/// `"INV - 2024 - 001"` becomes `"INV-2024-001"`.
pub fn normalize_document_number(raw: &str) -> String {
    let dashed = DASH_SPACING.replace_all(raw.trim(), "-");
    WHITESPACE.replace_all(&dashed, "").into_owned()
}

/// Normalize an amount to a plain two-decimal string with no currency or
/// thousands separators. Unparseable values are returned trimmed.
pub fn normalize_amount(raw: &str) -> String {
    parse_amount(raw)
        .map(format_amount)
        .unwrap_or_else(|| raw.trim().to_string())
}

/// Parse the first number in an amount string such as `RM 1,234.50`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let found = AMOUNT_DIGITS.find(raw)?;
    let cleaned: String = found.as_str().chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned).ok()
}

/// Normalize a date to `DD/MM/YYYY`. Unparseable values are returned trimmed.
pub fn normalize_date(raw: &str) -> String {
    parse_any(raw)
        .map(format_date)
        .unwrap_or_else(|| raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_number() {
        assert_eq!(normalize_document_number("INV - 2024 - 001"), "INV-2024-001");
        assert_eq!(normalize_document_number(" A B-C "), "AB-C");
        assert_eq!(normalize_document_number("INV-1"), "INV-1");
    }

    #[test]
    fn test_amount() {
        assert_eq!(normalize_amount("RM 1,234.5"), "1234.50");
        assert_eq!(normalize_amount("-45"), "-45.00");
        assert_eq!(normalize_amount("n/a"), "n/a");
    }

    #[test]
    fn test_date() {
        assert_eq!(normalize_date("5/1/24"), "05/01/2024");
        assert_eq!(normalize_date("2024-01-05"), "05/01/2024");
        assert_eq!(normalize_date("05 Jan 2024"), "05/01/2024");
        assert_eq!(normalize_date("soon"), "soon");
    }
}
