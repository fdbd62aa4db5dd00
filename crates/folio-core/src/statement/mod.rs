//! Statement grammars: turn reconstructed statement text into dated
//! transaction records.

pub mod flowing;
pub mod patterns;
pub mod tabular;

pub use flowing::FlowingGrammar;
pub use tabular::TabularGrammar;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Statement layout family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementFormat {
    /// Fixed columns: date, description, signed amount, balance.
    Tabular,
    /// Records that wrap across lines with a currency-marked amount.
    Flowing,
}

/// Parse a plain amount such as `1,234.56`, dropping thousands separators.
pub(crate) fn parse_plain_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    Decimal::from_str(&cleaned).ok()
}
