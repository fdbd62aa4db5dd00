//! Cheap date-range estimate from a few pages.
//!
//! Reads only the first and last pages of a document and collects every
//! date-looking substring. The result orders a batch before full
//! extraction; it is never used as extracted data.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dates::{parse_day_month_name, parse_numeric_dmy, DATE_DAY_MONTH_NAME, DATE_DMY_NUMERIC};
use crate::layout::reconstruct_page_text;
use crate::models::config::PeekConfig;
use crate::models::record::wire_date;
use crate::pdf::FragmentSource;

/// Earliest and latest date seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "wire_date")]
    pub start: NaiveDate,
    #[serde(with = "wire_date")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// Widen the range to include `date`.
    pub fn include(&mut self, date: NaiveDate) {
        self.start = self.start.min(date);
        self.end = self.end.max(date);
    }
}

/// Page indices to peek: the first `head` and last `tail` pages, ascending
/// and without duplicates.
pub fn peek_page_indices(page_count: usize, head: usize, tail: usize) -> Vec<usize> {
    let head_end = head.min(page_count);
    let tail_start = page_count.saturating_sub(tail).max(head_end);
    (0..head_end).chain(tail_start..page_count).collect()
}

/// Every date found in a block of text, in no particular order.
pub fn dates_in_text(text: &str) -> Vec<NaiveDate> {
    let named = DATE_DAY_MONTH_NAME
        .find_iter(text)
        .filter_map(|m| parse_day_month_name(m.as_str()));
    let numeric = DATE_DMY_NUMERIC
        .find_iter(text)
        .filter_map(|m| parse_numeric_dmy(m.as_str()));
    named.chain(numeric).collect()
}

/// Fold dates into a range. `None` when there are no dates.
pub fn range_of(dates: impl IntoIterator<Item = NaiveDate>) -> Option<DateRange> {
    dates.into_iter().fold(None, |range, date| match range {
        None => Some(DateRange::single(date)),
        Some(mut r) => {
            r.include(date);
            Some(r)
        }
    })
}

/// Estimate a document's date range from its head and tail pages. Pages
/// that fail to decode are skipped.
pub fn peek_date_range<S: FragmentSource + ?Sized>(
    source: &S,
    config: &PeekConfig,
    threshold: f64,
) -> Option<DateRange> {
    let indices = peek_page_indices(source.page_count(), config.head_pages, config.tail_pages);
    let mut range: Option<DateRange> = None;

    for index in indices {
        let page = match source.page_fragments(index) {
            Ok(page) => page,
            Err(e) => {
                warn!("Peek skipped page {}: {}", index, e);
                continue;
            }
        };
        let text = reconstruct_page_text(&page, threshold);
        if let Some(page_range) = range_of(dates_in_text(&text)) {
            range = Some(match range {
                None => page_range,
                Some(mut r) => {
                    r.include(page_range.start);
                    r.include(page_range.end);
                    r
                }
            });
        }
    }

    debug!("Peeked date range: {:?}", range);
    range
}

/// Order for batch pre-sorting: by start date, documents without a range
/// last.
pub fn compare_ranges(a: &Option<DateRange>, b: &Option<DateRange>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.start.cmp(&b.start),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
