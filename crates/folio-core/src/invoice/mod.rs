//! Invoice field extraction and template classification.

pub mod classifier;
pub mod extractor;
pub mod normalize;

pub use classifier::{Classification, ClassificationScore, TemplateClassifier};
pub use extractor::{extract_fields, try_extract_field, try_extract_fields, FieldResults};
pub use normalize::{normalize_amount, normalize_date, normalize_document_number};

use serde::{Deserialize, Serialize};

use crate::models::template::{InvoiceFieldSet, Template};

/// One processed invoice, ready for export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRow {
    /// Source file name.
    pub file: String,
    pub fields: InvoiceFieldSet,
    /// Template used for extraction, `None` when nothing matched.
    pub template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_export_name: Option<String>,
}

impl InvoiceRow {
    pub fn new(file: impl Into<String>, fields: InvoiceFieldSet, template: Option<&Template>) -> Self {
        Self {
            file: file.into(),
            fields,
            template_name: template.map(|t| t.name.clone()),
            official_export_name: template.and_then(|t| t.official_export_name.clone()),
        }
    }

    /// Supplier name for exports: the template's official name when set,
    /// otherwise the extracted one.
    pub fn export_supplier_name(&self) -> Option<&str> {
        self.official_export_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.fields.supplier_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_name_preferred() {
        let template = Template::new("acme").with_export_name("ACME Trading Sdn. Bhd.");
        let fields = InvoiceFieldSet {
            supplier_name: Some("ACME".to_string()),
            ..Default::default()
        };
        let row = InvoiceRow::new("a.pdf", fields, Some(&template));

        assert_eq!(row.template_name.as_deref(), Some("acme"));
        assert_eq!(row.export_supplier_name(), Some("ACME Trading Sdn. Bhd."));
    }

    #[test]
    fn test_extracted_name_without_export_name() {
        let fields = InvoiceFieldSet {
            supplier_name: Some("ACME".to_string()),
            ..Default::default()
        };
        let row = InvoiceRow::new("a.pdf", fields, None);

        assert_eq!(row.template_name, None);
        assert_eq!(row.export_supplier_name(), Some("ACME"));
    }
}
