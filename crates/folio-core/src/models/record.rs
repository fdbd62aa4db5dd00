//! Normalized output records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Wire format for every date leaving the engine.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// A single dated statement transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionRecord {
    /// Transaction date, serialized as `DD/MM/YYYY`.
    #[serde(with = "wire_date")]
    pub date: NaiveDate,

    /// Description with whitespace collapsed. Never empty.
    pub description: String,

    /// Signed amount, serialized with exactly two decimals.
    #[serde(with = "wire_amount")]
    pub amount: Decimal,
}

impl TransactionRecord {
    /// Create a record, normalizing the amount to two decimal places.
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            amount: to_fixed_2dp(amount),
        }
    }

    /// Date as `DD/MM/YYYY`.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Amount as a plain fixed two-decimal string.
    pub fn amount_string(&self) -> String {
        format_amount(self.amount)
    }
}

/// Round and pad a decimal to exactly two places.
pub fn to_fixed_2dp(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded
}

/// Format an amount as a plain decimal string with two places and no
/// thousands separators.
pub fn format_amount(amount: Decimal) -> String {
    to_fixed_2dp(amount).to_string()
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) mod wire_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod wire_amount {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    use super::format_amount;

    pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_amount(*amount))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Decimal::from_str(&raw).map_err(serde::de::Error::custom)
    }
}
