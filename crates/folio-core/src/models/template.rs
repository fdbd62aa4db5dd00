//! Invoice templates and extracted invoice fields.

use fancy_regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// The four invoice fields a template can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    SupplierName,
    DocumentDate,
    DocumentNumber,
    TotalAmount,
}

impl FieldKind {
    /// All fields, in export column order.
    pub const ALL: [FieldKind; 4] = [
        FieldKind::SupplierName,
        FieldKind::DocumentDate,
        FieldKind::DocumentNumber,
        FieldKind::TotalAmount,
    ];

    /// Human-readable column label.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::SupplierName => "Supplier Name",
            FieldKind::DocumentDate => "Document Date",
            FieldKind::DocumentNumber => "Document Number",
            FieldKind::TotalAmount => "Total Amount",
        }
    }

    /// Classification weight of a matching pattern for this field.
    pub fn weight(&self) -> u32 {
        match self {
            FieldKind::SupplierName => 4,
            FieldKind::DocumentNumber => 3,
            FieldKind::TotalAmount => 2,
            FieldKind::DocumentDate => 1,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A named set of regex patterns for one supplier's invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique template name.
    pub name: String,

    /// Supplier name written to exports instead of the extracted one.
    #[serde(
        default,
        rename = "officialSupplierNameForExport",
        alias = "officialExportName",
        skip_serializing_if = "Option::is_none"
    )]
    pub official_export_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_date_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_number_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount_pattern: Option<String>,
}

impl Template {
    /// Create an empty template with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, kind: FieldKind, pattern: impl Into<String>) -> Self {
        let pattern = Some(pattern.into());
        match kind {
            FieldKind::SupplierName => self.supplier_name_pattern = pattern,
            FieldKind::DocumentDate => self.document_date_pattern = pattern,
            FieldKind::DocumentNumber => self.document_number_pattern = pattern,
            FieldKind::TotalAmount => self.total_amount_pattern = pattern,
        }
        self
    }

    pub fn with_export_name(mut self, name: impl Into<String>) -> Self {
        self.official_export_name = Some(name.into());
        self
    }

    /// The pattern string for a field, if one is set and non-blank.
    pub fn pattern(&self, kind: FieldKind) -> Option<&str> {
        let pattern = match kind {
            FieldKind::SupplierName => &self.supplier_name_pattern,
            FieldKind::DocumentDate => &self.document_date_pattern,
            FieldKind::DocumentNumber => &self.document_number_pattern,
            FieldKind::TotalAmount => &self.total_amount_pattern,
        };
        pattern.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Compile every present pattern and report the ones that fail.
    pub fn validate(&self) -> Vec<PatternError> {
        FieldKind::ALL
            .iter()
            .filter_map(|kind| {
                self.pattern(*kind)
                    .and_then(|p| compile_pattern(*kind, p).err())
            })
            .collect()
    }
}

/// Compile a user-authored pattern case-insensitively. Look-around and
/// backreferences are accepted.
pub fn compile_pattern(kind: FieldKind, pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| PatternError {
            field: kind.label().to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Invoice fields extracted with one template. Unmatched fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFieldSet {
    pub supplier_name: Option<String>,
    pub document_date: Option<String>,
    pub document_number: Option<String>,
    pub total_amount: Option<String>,
}

impl InvoiceFieldSet {
    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::SupplierName => self.supplier_name.as_deref(),
            FieldKind::DocumentDate => self.document_date.as_deref(),
            FieldKind::DocumentNumber => self.document_number.as_deref(),
            FieldKind::TotalAmount => self.total_amount.as_deref(),
        }
    }

    pub fn set(&mut self, kind: FieldKind, value: Option<String>) {
        match kind {
            FieldKind::SupplierName => self.supplier_name = value,
            FieldKind::DocumentDate => self.document_date = value,
            FieldKind::DocumentNumber => self.document_number = value,
            FieldKind::TotalAmount => self.total_amount = value,
        }
    }

    /// True when no field matched.
    pub fn is_empty(&self) -> bool {
        FieldKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }
}
