//! Wrapped-line statement grammar.
//!
//! Each record starts with a `DD Mon YYYY` line. Until a currency-marked
//! amount is seen, following lines extend the record's description. Once
//! the amount is known, further lines belong to the record completed
//! before it.

use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use tracing::{debug, info, trace, warn};

use super::parse_plain_amount;
use super::patterns::{BARE_AMOUNT, FLOWING_DATE};
use crate::dates::parse_day_month_name;
use crate::models::config::StatementConfig;
use crate::models::record::{collapse_whitespace, TransactionRecord};

/// A record being assembled from consecutive lines.
#[derive(Debug, Clone, Default, PartialEq)]
struct PendingTransaction {
    date_text: String,
    description: Vec<String>,
    amount: Option<Decimal>,
}

/// Assembly state. `completed` holds finished records in document order.
#[derive(Debug, Default)]
struct FlowState {
    current: Option<PendingTransaction>,
    completed: Vec<PendingTransaction>,
}

impl FlowState {
    /// A date line opens a new record; the open one is completed first.
    fn start(&mut self, pending: PendingTransaction) {
        if let Some(done) = self.current.replace(pending) {
            self.completed.push(done);
        }
    }

    /// A line with no date of its own.
    fn continue_with(&mut self, line: &str, amount_pattern: &Regex) {
        let Some(current) = self.current.as_mut() else {
            trace!("Ignoring line before first record: {:?}", line);
            return;
        };

        if current.amount.is_none() {
            let (remainder, amount) = split_amount(line, amount_pattern);
            current.amount = amount;
            if !remainder.is_empty() {
                current.description.push(remainder.to_string());
            }
            return;
        }

        // The open record already has its amount: the line trails the
        // record completed before it.
        match self.completed.last_mut() {
            Some(previous) => previous.description.push(line.to_string()),
            None => current.description.push(line.to_string()),
        }
    }

    fn finish(mut self) -> Vec<PendingTransaction> {
        if let Some(done) = self.current.take() {
            self.completed.push(done);
        }
        self.completed
    }
}

/// Grammar for statements whose records wrap across lines.
pub struct FlowingGrammar {
    amount_pattern: Regex,
}

impl FlowingGrammar {
    /// Build the grammar for the given currency markers (e.g. `RM`).
    pub fn new(currencies: &[String]) -> Self {
        let markers: Vec<String> = currencies
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(|c| {
                let escaped = regex::escape(c);
                if c.starts_with(|ch: char| ch.is_alphanumeric()) {
                    format!(r"\b{}", escaped)
                } else {
                    escaped
                }
            })
            .collect();

        if markers.is_empty() {
            return Self {
                amount_pattern: BARE_AMOUNT.clone(),
            };
        }

        let pattern = format!(
            r"(?P<sign>-)?\s*(?:{})\s*(?P<value>\d[\d,]*(?:\.\d+)?)\s*$",
            markers.join("|")
        );
        let amount_pattern = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| {
                warn!("Currency markers produced an invalid pattern ({}), using bare amounts", e);
                BARE_AMOUNT.clone()
            });

        Self { amount_pattern }
    }

    pub fn from_config(config: &StatementConfig) -> Self {
        Self::new(&config.currencies)
    }

    /// Parse the reconstructed statement text.
    pub fn parse(&self, text: &str) -> Vec<TransactionRecord> {
        let mut state = FlowState::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || is_column_header(line) {
                continue;
            }

            if let Some(caps) = FLOWING_DATE.captures(line) {
                let rest = caps["rest"].trim();
                let (remainder, amount) = split_amount(rest, &self.amount_pattern);

                let mut pending = PendingTransaction {
                    date_text: caps["date"].to_string(),
                    amount,
                    ..Default::default()
                };
                if !remainder.is_empty() {
                    pending.description.push(remainder.to_string());
                }
                state.start(pending);
            } else {
                state.continue_with(line, &self.amount_pattern);
            }
        }

        let pending = state.finish();
        debug!("Assembled {} flowing records", pending.len());

        let records: Vec<TransactionRecord> = pending.into_iter().filter_map(normalize).collect();
        info!("Parsed {} flowing transactions", records.len());
        records
    }
}

impl Default for FlowingGrammar {
    fn default() -> Self {
        Self::from_config(&StatementConfig::default())
    }
}

/// Split a trailing signed currency amount off a line.
fn split_amount<'a>(line: &'a str, amount_pattern: &Regex) -> (&'a str, Option<Decimal>) {
    let Some(caps) = amount_pattern.captures(line) else {
        return (line.trim(), None);
    };
    let Some(whole) = caps.get(0) else {
        return (line.trim(), None);
    };

    match parse_plain_amount(&caps["value"]) {
        Some(mut amount) => {
            if caps.name("sign").is_some() {
                amount = -amount;
            }
            (line[..whole.start()].trim(), Some(amount))
        }
        None => (line.trim(), None),
    }
}

fn is_column_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    ["date", "description", "amount"]
        .iter()
        .any(|h| lower.starts_with(h))
}

fn normalize(pending: PendingTransaction) -> Option<TransactionRecord> {
    let Some(date) = parse_day_month_name(&pending.date_text) else {
        warn!("Skipping record with unparseable date {:?}", pending.date_text);
        return None;
    };
    let Some(amount) = pending.amount else {
        warn!("Skipping record on {} without an amount", pending.date_text);
        return None;
    };

    let description = strip_wrapping_quotes(&collapse_whitespace(&pending.description.join(" ")));
    if description.is_empty() {
        warn!("Skipping record on {} without a description", pending.date_text);
        return None;
    }

    Some(TransactionRecord::new(date, description, amount))
}

/// Remove one layer of surrounding double quotes.
fn strip_wrapping_quotes(text: &str) -> String {
    let stripped = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    stripped.trim().to_string()
}
