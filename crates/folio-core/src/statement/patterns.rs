//! Regex patterns for statement parsing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Statement date header (bilingual): "STATEMENT DATE : 31/01/24"
    pub static ref STATEMENT_DATE: Regex = Regex::new(
        r"(?i)(?:STATEMENT\s+DATE|TARIKH\s+PENYATA)\s*:?\s*(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b"
    ).unwrap();

    // Tabular transaction line:
    // "01/02 GROCERY STORE 45.00- 1,234.56"
    // date is optional, the trailing balance column is optional
    pub static ref TABULAR_TRANSACTION: Regex = Regex::new(concat!(
        r"^(?:(?P<date>\d{2}/\d{2})\s+)?",
        r"(?P<desc>.*?)\s*",
        r"(?P<amount>\d[\d,]*\.\d{2})(?P<sign>[+-])",
        r"(?:\s+(?P<balance>\d[\d,]*\.\d{2})(?:[+-]|\s*DR)?)?$"
    )).unwrap();

    // A continuation line that carries its own DD/MM date
    pub static ref LEADING_DAY_MONTH: Regex = Regex::new(
        r"^(?P<date>\d{2}/\d{2})\s+(?P<rest>.*)$"
    ).unwrap();

    // Bare "=====" separators
    pub static ref SEPARATOR: Regex = Regex::new(r"^=+$").unwrap();

    // Trailing signed amount with no currency marker
    pub static ref BARE_AMOUNT: Regex = Regex::new(
        r"(?P<sign>-)?\s*(?P<value>\d[\d,]*(?:\.\d+)?)\s*$"
    ).unwrap();

    // Flowing transaction start: "01 Jan 2024 ..."
    pub static ref FLOWING_DATE: Regex = Regex::new(
        r"^(?P<date>\d{1,2}\s+[A-Za-z]{3,4}\s+\d{4})\b\s*(?P<rest>.*)$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabular_with_date_and_balance() {
        let caps = TABULAR_TRANSACTION
            .captures("01/02 GROCERY STORE 45.00- 1,234.56")
            .unwrap();
        assert_eq!(&caps["date"], "01/02");
        assert_eq!(&caps["desc"], "GROCERY STORE");
        assert_eq!(&caps["amount"], "45.00");
        assert_eq!(&caps["sign"], "-");
        assert_eq!(&caps["balance"], "1,234.56");
    }

    #[test]
    fn test_tabular_without_date() {
        let caps = TABULAR_TRANSACTION.captures("SALARY 3,000.00+").unwrap();
        assert!(caps.name("date").is_none());
        assert_eq!(&caps["desc"], "SALARY");
        assert_eq!(&caps["amount"], "3,000.00");
        assert_eq!(&caps["sign"], "+");
    }

    #[test]
    fn test_tabular_rejects_unsigned_amount() {
        assert!(!TABULAR_TRANSACTION.is_match("01/02 GROCERY STORE 45.00"));
    }

    #[test]
    fn test_statement_date() {
        let caps = STATEMENT_DATE.captures("STATEMENT DATE : 31/01/24").unwrap();
        assert_eq!(&caps[3], "24");
    }

    #[test]
    fn test_flowing_date() {
        let caps = FLOWING_DATE.captures("01 Jan 2024 Coffee Shop RM 12.50").unwrap();
        assert_eq!(&caps["date"], "01 Jan 2024");
        assert_eq!(&caps["rest"], "Coffee Shop RM 12.50");
    }
}
