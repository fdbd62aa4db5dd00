//! Date parsing shared by the statement grammars, the peeker and invoice
//! normalization.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::record::DATE_FORMAT;

lazy_static! {
    /// `05 Jan 2024`, `5 JAN 2024`, `05 Ogos 2024`.
    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"\b(\d{1,2})\s+([A-Za-z]{3,4})\s+(\d{4})\b"
    ).unwrap();

    /// `05/01/24`, `05/01/2024`, `5-1-2024`, `05.01.2024`.
    pub static ref DATE_DMY_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    /// `2024-01-05`.
    pub static ref DATE_YMD_NUMERIC: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();
}

/// Parse a `DD Mon YYYY` date. English and Malay month abbreviations are
/// accepted, case-insensitively.
pub fn parse_day_month_name(text: &str) -> Option<NaiveDate> {
    let caps = DATE_DAY_MONTH_NAME.captures(text.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_from_name(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a `DD/MM/YY` or `DD/MM/YYYY` date (also `-` and `.` separators).
pub fn parse_numeric_dmy(text: &str) -> Option<NaiveDate> {
    let caps = DATE_DMY_NUMERIC.captures(text.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year = parse_year(&caps[3])?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse an ISO-style `YYYY-MM-DD` date.
pub fn parse_numeric_ymd(text: &str) -> Option<NaiveDate> {
    let caps = DATE_YMD_NUMERIC.captures(text.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse any supported date shape.
pub fn parse_any(text: &str) -> Option<NaiveDate> {
    parse_numeric_ymd(text)
        .or_else(|| parse_numeric_dmy(text))
        .or_else(|| parse_day_month_name(text))
}

/// Format a date for the wire (`DD/MM/YYYY`).
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Expand a two-digit year into the 2000s; four-digit years pass through.
pub fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" | "mac" => 3,
        "apr" => 4,
        "may" | "mei" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "ogos" => 8,
        "sep" | "sept" => 9,
        "oct" | "okt" => 10,
        "nov" => 11,
        "dec" | "dis" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_month_name_round_trip() {
        let date = parse_day_month_name("05 Jan 2024").unwrap();
        assert_eq!(format_date(date), "05/01/2024");
    }

    #[test]
    fn test_day_month_name_variants() {
        assert_eq!(parse_day_month_name("1 JAN 2024"), Some(ymd(2024, 1, 1)));
        assert_eq!(parse_day_month_name("15 Ogos 2023"), Some(ymd(2023, 8, 15)));
        assert_eq!(parse_day_month_name("31 Feb 2024"), None);
        assert_eq!(parse_day_month_name("01 Foo 2024"), None);
    }

    #[test]
    fn test_numeric_dmy() {
        assert_eq!(parse_numeric_dmy("05/01/24"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_numeric_dmy("05/01/2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_numeric_dmy("5.1.2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_numeric_dmy("13/13/2024"), None);
    }

    #[test]
    fn test_parse_any() {
        assert_eq!(parse_any("2024-03-09"), Some(ymd(2024, 3, 9)));
        assert_eq!(parse_any("Dated 09 Mar 2024"), Some(ymd(2024, 3, 9)));
        assert_eq!(parse_any("no date here"), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("24"), Some(2024));
        assert_eq!(parse_year("1999"), Some(1999));
        assert_eq!(parse_year("123"), None);
    }
}
