//! Template-driven invoice field extraction.

use tracing::{debug, warn};

use super::normalize::normalize_document_number;
use crate::error::PatternError;
use crate::models::template::{compile_pattern, FieldKind, InvoiceFieldSet, Template};

/// Outcome of running one field pattern.
pub type FieldResult = Result<Option<String>, PatternError>;

/// Per-field outcomes for a whole template, in [`FieldKind::ALL`] order.
#[derive(Debug, Clone)]
pub struct FieldResults {
    pub results: Vec<(FieldKind, FieldResult)>,
}

impl FieldResults {
    /// Collapse into a field set, treating pattern errors as no match.
    pub fn into_field_set(self) -> InvoiceFieldSet {
        let mut fields = InvoiceFieldSet::default();
        for (kind, result) in self.results {
            match result {
                Ok(value) => fields.set(kind, value),
                Err(e) => warn!("{}", e),
            }
        }
        fields
    }

    /// Pattern errors encountered, if any.
    pub fn errors(&self) -> Vec<&PatternError> {
        self.results
            .iter()
            .filter_map(|(_, r)| r.as_ref().err())
            .collect()
    }
}

/// Run one pattern against the text.
///
/// The pattern is compiled case-insensitively. Capture group 1 is used when
/// it matched a non-empty string, otherwise the whole match. Values are
/// trimmed and an empty value is no match; document numbers are also dash
/// and whitespace normalized.
pub fn try_extract_field(text: &str, kind: FieldKind, pattern: &str) -> FieldResult {
    let regex = compile_pattern(kind, pattern)?;

    let caps = match regex.captures(text) {
        Ok(Some(caps)) => caps,
        Ok(None) => return Ok(None),
        Err(e) => {
            warn!("{} pattern {:?} gave up on input: {}", kind.label(), pattern, e);
            return Ok(None);
        }
    };

    let matched = caps
        .get(1)
        .filter(|m| !m.as_str().is_empty())
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty());
    let value = matched.map(|v| match kind {
        FieldKind::DocumentNumber => normalize_document_number(v),
        _ => v.to_string(),
    });

    Ok(value)
}

/// Run every present pattern of a template, keeping per-field errors.
pub fn try_extract_fields(text: &str, template: &Template) -> FieldResults {
    let results = FieldKind::ALL
        .iter()
        .map(|kind| {
            let result = match template.pattern(*kind) {
                Some(pattern) => try_extract_field(text, *kind, pattern),
                None => Ok(None),
            };
            (*kind, result)
        })
        .collect();

    FieldResults { results }
}

/// Extract all fields of a template. Invalid patterns resolve to `None`.
pub fn extract_fields(text: &str, template: &Template) -> InvoiceFieldSet {
    let fields = try_extract_fields(text, template).into_field_set();
    debug!(
        "Template {:?} extracted {} of {} fields",
        template.name,
        FieldKind::ALL.iter().filter(|k| fields.get(**k).is_some()).count(),
        FieldKind::ALL.len()
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_number_normalized() {
        let value = try_extract_field(
            "Invoice No: INV - 2024 - 001",
            FieldKind::DocumentNumber,
            r"Invoice No:\s*([\w\s-]+)",
        )
        .unwrap();
        assert_eq!(value.as_deref(), Some("INV-2024-001"));
    }

    #[test]
    fn test_case_insensitive_and_whole_match() {
        let value = try_extract_field("ACME Trading Sdn Bhd", FieldKind::SupplierName, "acme trading").unwrap();
        assert_eq!(value.as_deref(), Some("ACME Trading"));
    }

    #[test]
    fn test_no_match_is_none() {
        let value = try_extract_field("nothing here", FieldKind::TotalAmount, r"Total:\s*(\S+)").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let err = try_extract_field("text", FieldKind::DocumentDate, "([").unwrap_err();
        assert_eq!(err.field, "Document Date");
        assert_eq!(err.pattern, "([");
    }

    #[test]
    fn test_extract_fields_swallows_invalid_pattern() {
        let template = Template::new("acme")
            .with_pattern(FieldKind::SupplierName, r"(ACME\s+\w+)")
            .with_pattern(FieldKind::DocumentDate, r"Date:\s*(\d{2}/\d{2}/\d{4})")
            .with_pattern(FieldKind::DocumentNumber, "(unclosed")
            .with_pattern(FieldKind::TotalAmount, r"Total\s*:\s*RM\s*([\d,.]+)");

        let text = "ACME Trading\nDate: 05/01/2024\nInvoice No: 77\nTotal : RM 1,200.00";
        let fields = extract_fields(text, &template);

        assert_eq!(
            fields,
            InvoiceFieldSet {
                supplier_name: Some("ACME Trading".to_string()),
                document_date: Some("05/01/2024".to_string()),
                document_number: None,
                total_amount: Some("1,200.00".to_string()),
            }
        );
    }

    #[test]
    fn test_try_extract_fields_reports_errors() {
        let template = Template::new("broken").with_pattern(FieldKind::TotalAmount, "[");
        let results = try_extract_fields("x", &template);
        assert_eq!(results.errors().len(), 1);
    }

    #[test]
    fn test_optional_group_falls_back_to_whole_match() {
        let value = try_extract_field("Ref 42", FieldKind::DocumentNumber, r"Ref (x)?\d+").unwrap();
        assert_eq!(value.as_deref(), Some("Ref42"));
    }

    #[test]
    fn test_lookbehind_pattern() {
        let value = try_extract_field(
            "Invoice No: INV-77",
            FieldKind::DocumentNumber,
            r"(?<=Invoice No:\s)\S+",
        )
        .unwrap();
        assert_eq!(value.as_deref(), Some("INV-77"));
    }

    #[test]
    fn test_empty_group_falls_back_to_whole_match() {
        let value = try_extract_field("Total: RM", FieldKind::TotalAmount, r"Total:\s*RM\s*(\d*)").unwrap();
        assert_eq!(value.as_deref(), Some("Total: RM"));
    }

    #[test]
    fn test_empty_match_is_none() {
        let value = try_extract_field("no digits", FieldKind::TotalAmount, r"\d*").unwrap();
        assert_eq!(value, None);
    }
}
