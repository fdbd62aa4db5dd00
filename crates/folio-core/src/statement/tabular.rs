//! Fixed-column statement grammar.
//!
//! Lines are filtered down to the transaction block and then read bottom
//! up. Description lines that follow a transaction row in the document are
//! collected first and attached when the row itself is reached.

use chrono::{Datelike, Local, NaiveDate};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use tracing::{debug, info, trace, warn};

use super::parse_plain_amount;
use super::patterns::{LEADING_DAY_MONTH, SEPARATOR, STATEMENT_DATE, TABULAR_TRANSACTION};
use crate::dates::parse_year;
use crate::models::config::StatementConfig;
use crate::models::record::{collapse_whitespace, TransactionRecord};

/// A transaction row recognised while scanning, before normalization.
#[derive(Debug, Clone, PartialEq)]
struct RawTransaction {
    /// `DD/MM`
    day_month: String,
    description: String,
    amount: Decimal,
}

/// How a filtered line contributes to the reverse scan.
#[derive(Debug, Clone, PartialEq)]
enum LineKind {
    Transaction {
        day_month: Option<String>,
        description: String,
        amount: Decimal,
    },
    Nullifier,
    Description(String),
    Noise,
}

/// Description stitching state for the reverse scan.
///
/// Lines arrive bottom up; `Accumulating` holds them in arrival order.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) enum Stitch {
    #[default]
    AwaitingRecord,
    Accumulating(Vec<String>),
}

impl Stitch {
    /// Remember a description line for the next transaction up.
    pub(crate) fn push(&mut self, line: String) {
        match self {
            Stitch::AwaitingRecord => *self = Stitch::Accumulating(vec![line]),
            Stitch::Accumulating(lines) => lines.push(line),
        }
    }

    /// Drop anything accumulated.
    pub(crate) fn reset(&mut self) {
        *self = Stitch::AwaitingRecord;
    }

    /// Hand over the accumulated lines in document order and reset.
    pub(crate) fn take(&mut self) -> Vec<String> {
        match std::mem::take(self) {
            Stitch::AwaitingRecord => Vec::new(),
            Stitch::Accumulating(mut lines) => {
                lines.reverse();
                lines
            }
        }
    }
}

/// Grammar for fixed-column statements.
pub struct TabularGrammar {
    start_markers: Vec<String>,
    end_markers: Vec<String>,
    header_markers: Vec<String>,
    nullifying_markers: Vec<String>,
    boilerplate: Option<Regex>,
}

impl TabularGrammar {
    /// Build the grammar from marker configuration.
    pub fn new(config: &StatementConfig) -> Self {
        fn upper(items: &[String]) -> Vec<String> {
            items
                .iter()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        }

        let alternatives: Vec<String> = config
            .boilerplate
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| regex::escape(s.trim()))
            .collect();
        let boilerplate = if alternatives.is_empty() {
            None
        } else {
            RegexBuilder::new(&alternatives.join("|"))
                .case_insensitive(true)
                .build()
                .ok()
        };

        Self {
            start_markers: upper(&config.block_start_markers),
            end_markers: upper(&config.block_end_markers),
            header_markers: upper(&config.header_markers),
            nullifying_markers: upper(&config.nullifying_markers),
            boilerplate,
        }
    }

    /// Parse statement lines, falling back to the current year when the
    /// statement date is missing.
    pub fn parse(&self, lines: &[String]) -> Vec<TransactionRecord> {
        self.parse_with_fallback_year(lines, Local::now().year())
    }

    /// Parse statement lines with an explicit fallback year.
    pub fn parse_with_fallback_year(&self, lines: &[String], fallback_year: i32) -> Vec<TransactionRecord> {
        let year = statement_year(lines).unwrap_or_else(|| {
            debug!("No statement date marker, using year {}", fallback_year);
            fallback_year
        });

        let block = self.transaction_block(lines);
        debug!("Transaction block holds {} of {} lines", block.len(), lines.len());

        let raw = self.stitch_reverse(&block);

        let records: Vec<TransactionRecord> = raw
            .into_iter()
            .filter_map(|tx| self.normalize(tx, year))
            .collect();

        info!("Parsed {} tabular transactions", records.len());
        records
    }

    /// Keep the lines between a start marker and a closing-balance marker,
    /// minus headers and separators.
    fn transaction_block<'a>(&self, lines: &'a [String]) -> Vec<&'a str> {
        let mut in_block = false;
        let mut block = Vec::new();

        for line in lines {
            let line = line.trim();
            let upper = line.to_uppercase();

            if !in_block {
                if contains_any(&upper, &self.start_markers) {
                    trace!("Entering transaction block at {:?}", line);
                    in_block = true;
                }
                continue;
            }

            if contains_any(&upper, &self.end_markers) {
                trace!("Leaving transaction block at {:?}", line);
                in_block = false;
                continue;
            }

            if contains_any(&upper, &self.start_markers)
                || contains_any(&upper, &self.header_markers)
                || SEPARATOR.is_match(line)
            {
                continue;
            }

            block.push(line);
        }

        block
    }

    fn classify(&self, line: &str) -> LineKind {
        let upper = line.to_uppercase();
        if contains_any(&upper, &self.nullifying_markers) {
            return LineKind::Nullifier;
        }

        if let Some(caps) = TABULAR_TRANSACTION.captures(line) {
            if let Some(mut amount) = parse_plain_amount(&caps["amount"]) {
                if &caps["sign"] == "-" {
                    amount = -amount;
                }
                return LineKind::Transaction {
                    day_month: caps.name("date").map(|m| m.as_str().to_string()),
                    description: caps["desc"].trim().to_string(),
                    amount,
                };
            }
        }

        if line.chars().count() > 1 {
            LineKind::Description(line.to_string())
        } else {
            LineKind::Noise
        }
    }

    /// Walk the block bottom up, attaching trailing description lines to the
    /// transaction row above them. Returns rows in document order.
    fn stitch_reverse(&self, block: &[&str]) -> Vec<RawTransaction> {
        let mut stitch = Stitch::default();
        let mut collected = Vec::new();

        for line in block.iter().rev() {
            match self.classify(line) {
                LineKind::Transaction {
                    day_month,
                    description,
                    amount,
                } => {
                    let mut trailing = stitch.take();

                    let day_month = match day_month {
                        Some(dm) => dm,
                        None => match take_dated_line(&mut trailing) {
                            Some(dm) => dm,
                            None => {
                                warn!("Dropping undated transaction row {:?}", line);
                                continue;
                            }
                        },
                    };

                    let mut parts = Vec::with_capacity(trailing.len() + 1);
                    parts.push(description);
                    parts.extend(trailing);

                    collected.push(RawTransaction {
                        day_month,
                        description: parts.join(" "),
                        amount,
                    });
                }
                LineKind::Nullifier => {
                    trace!("Nullifying marker {:?}", line);
                    stitch.reset();
                }
                LineKind::Description(text) => stitch.push(text),
                LineKind::Noise => {}
            }
        }

        collected.reverse();
        collected
    }

    fn normalize(&self, tx: RawTransaction, year: i32) -> Option<TransactionRecord> {
        let date = match day_month_with_year(&tx.day_month, year) {
            Some(date) => date,
            None => {
                warn!("Skipping transaction with invalid date {}/{}", tx.day_month, year);
                return None;
            }
        };

        let cleaned = match &self.boilerplate {
            Some(re) => collapse_whitespace(&re.replace_all(&tx.description, " ")),
            None => collapse_whitespace(&tx.description),
        };
        let description = if cleaned.is_empty() {
            collapse_whitespace(&tx.description)
        } else {
            cleaned
        };

        if description.is_empty() {
            warn!("Skipping transaction on {} without description", tx.day_month);
            return None;
        }

        Some(TransactionRecord::new(date, description, tx.amount))
    }
}

impl Default for TabularGrammar {
    fn default() -> Self {
        Self::new(&StatementConfig::default())
    }
}

/// Year from a "STATEMENT DATE: DD/MM/YY" marker anywhere in the document.
pub fn statement_year(lines: &[String]) -> Option<i32> {
    let joined = lines.join("\n");
    let caps = STATEMENT_DATE.captures(&joined)?;
    parse_year(&caps[3])
}

/// Remove the first trailing line that starts with its own `DD/MM` date,
/// leaving its remainder in place. Returns the date.
fn take_dated_line(trailing: &mut Vec<String>) -> Option<String> {
    let index = trailing.iter().position(|l| LEADING_DAY_MONTH.is_match(l))?;
    let caps = LEADING_DAY_MONTH.captures(&trailing[index])?;
    let date = caps["date"].to_string();
    let rest = caps["rest"].trim().to_string();

    if rest.is_empty() {
        trailing.remove(index);
    } else {
        trailing[index] = rest;
    }
    Some(date)
}

fn day_month_with_year(day_month: &str, year: i32) -> Option<NaiveDate> {
    let (day, month) = day_month.split_once('/')?;
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn contains_any(upper_line: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| upper_line.contains(m.as_str()))
}
