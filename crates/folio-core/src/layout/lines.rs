//! Line grouping and streaming text reconstruction.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::trace;

use super::{Page, TextFragment};

/// Group one page's fragments into lines keyed by rounded y.
///
/// Lines run top to bottom (descending y); fragments within a line run left
/// to right and are joined with single spaces.
pub fn group_page_lines(page: &Page) -> Vec<String> {
    let mut rows: BTreeMap<i64, Vec<&TextFragment>> = BTreeMap::new();

    for fragment in &page.fragments {
        rows.entry(round_half_up(fragment.y)).or_default().push(fragment);
    }

    let lines: Vec<String> = rows
        .into_iter()
        .rev()
        .map(|(_, mut row)| {
            // sort_by is stable: equal x keeps encounter order
            row.sort_by(|a, b| compare_x(a, b));
            row.iter()
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    trace!("Grouped {} fragments into {} lines", page.len(), lines.len());
    lines
}

/// Group every page into lines, concatenated in page order.
pub fn group_lines(pages: &[Page]) -> Vec<String> {
    pages.iter().flat_map(group_page_lines).collect()
}

/// Reconstruct one page as a list of lines by streaming fragments in reading
/// order and starting a new line whenever y moves more than `threshold`
/// from the previous fragment. Fragments merged into one line are emitted
/// left to right.
pub fn reconstruct_page_lines(page: &Page, threshold: f64) -> Vec<String> {
    let mut ordered: Vec<&TextFragment> = page.fragments.iter().collect();
    ordered.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| compare_x(a, b))
    });

    let mut lines = Vec::new();
    let mut current: Vec<&TextFragment> = Vec::new();
    let mut previous_y: Option<f64> = None;

    for fragment in ordered {
        if let Some(prev) = previous_y {
            if (fragment.y - prev).abs() > threshold {
                flush(&mut current, &mut lines);
            }
        }
        current.push(fragment);
        previous_y = Some(fragment.y);
    }
    flush(&mut current, &mut lines);

    lines
}

/// Reconstruct one page as newline-separated text.
pub fn reconstruct_page_text(page: &Page, threshold: f64) -> String {
    reconstruct_page_lines(page, threshold).join("\n")
}

/// Reconstruct a whole document as newline-separated text.
pub fn reconstruct_text(pages: &[Page], threshold: f64) -> String {
    pages
        .iter()
        .flat_map(|page| reconstruct_page_lines(page, threshold))
        .collect::<Vec<_>>()
        .join("\n")
}

fn flush(current: &mut Vec<&TextFragment>, lines: &mut Vec<String>) {
    current.sort_by(|a, b| compare_x(a, b));
    let line = current
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let line = line.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

fn compare_x(a: &TextFragment, b: &TextFragment) -> Ordering {
    a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal)
}

/// Round to the nearest integer with halves going up (2.5 -> 3, -2.5 -> -2).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
