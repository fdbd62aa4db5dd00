//! Document and batch processing.
//!
//! A [`Session`] carries everything one run needs: configuration, the
//! template library, an optional pinned template and the document kind.
//! Pages are pulled one at a time so a [`CancellationToken`] can stop the
//! work between pages and between documents.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, FolioError, Result};
use crate::invoice::{extract_fields, Classification, InvoiceRow, TemplateClassifier};
use crate::layout::{group_lines, reconstruct_text, Page};
use crate::models::config::FolioConfig;
use crate::models::record::TransactionRecord;
use crate::models::template::{InvoiceFieldSet, Template};
use crate::pdf::FragmentSource;
use crate::peek::{compare_ranges, peek_date_range, DateRange};
use crate::statement::{FlowingGrammar, StatementFormat, TabularGrammar};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(FolioError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What kind of document a session processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Statement(StatementFormat),
    Invoice,
}

/// Batch-level behavior.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Peek each document's date range and process earliest first.
    pub presort_by_date: bool,
    /// Stable-sort the combined transactions by date.
    pub sort_transactions: bool,
}

/// Explicit processing context.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: FolioConfig,
    pub templates: Vec<Template>,
    /// Template to use for every invoice, skipping classification.
    pub active_template: Option<String>,
    pub kind: DocumentKind,
    pub batch: BatchOptions,
}

impl Session {
    pub fn new(config: FolioConfig, kind: DocumentKind) -> Self {
        Self {
            config,
            templates: Vec::new(),
            active_template: None,
            kind,
            batch: BatchOptions::default(),
        }
    }

    pub fn with_templates(mut self, templates: Vec<Template>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_active_template(mut self, name: impl Into<String>) -> Self {
        self.active_template = Some(name.into());
        self
    }

    pub fn with_batch_options(mut self, batch: BatchOptions) -> Self {
        self.batch = batch;
        self
    }

    fn threshold(&self) -> f64 {
        self.config.layout.line_merge_threshold
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "data")]
pub enum DocumentOutput {
    Transactions(Vec<TransactionRecord>),
    Invoice(InvoiceRow),
}

/// Read every page in order, checking for cancellation between pages.
pub fn load_pages<S: FragmentSource + ?Sized>(source: &S, token: &CancellationToken) -> Result<Vec<Page>> {
    let count = source.page_count();
    let mut pages = Vec::with_capacity(count);
    for index in 0..count {
        token.check()?;
        pages.push(source.page_fragments(index)?);
    }
    debug!("Loaded {} pages", pages.len());
    Ok(pages)
}

/// Process one document according to the session's kind.
///
/// Invoice rows come back with an empty `file`; callers that know the
/// document name set it.
pub fn process_document<S: FragmentSource + ?Sized>(
    source: &S,
    session: &Session,
    token: &CancellationToken,
) -> Result<DocumentOutput> {
    let pages = load_pages(source, token)?;
    if pages.iter().all(Page::is_empty) {
        return Err(ExtractionError::NoText.into());
    }

    match session.kind {
        DocumentKind::Statement(StatementFormat::Tabular) => {
            let lines = group_lines(&pages);
            let grammar = TabularGrammar::new(&session.config.statement);
            Ok(DocumentOutput::Transactions(grammar.parse(&lines)))
        }
        DocumentKind::Statement(StatementFormat::Flowing) => {
            let text = reconstruct_text(&pages, session.threshold());
            let grammar = FlowingGrammar::from_config(&session.config.statement);
            Ok(DocumentOutput::Transactions(grammar.parse(&text)))
        }
        DocumentKind::Invoice => {
            let text = reconstruct_text(&pages, session.threshold());
            process_invoice_text(&text, session).map(DocumentOutput::Invoice)
        }
    }
}

/// Pick a template for the text and extract with it.
pub fn process_invoice_text(text: &str, session: &Session) -> Result<InvoiceRow> {
    let template = match &session.active_template {
        Some(name) => Some(
            session
                .templates
                .iter()
                .find(|t| &t.name == name)
                .cloned()
                .ok_or_else(|| ExtractionError::UnknownTemplate(name.clone()))?,
        ),
        None => {
            let classifier = TemplateClassifier::from_config(&session.config.classification);
            match classifier.classify(text, &session.templates) {
                Classification::Matched { template, .. } => Some(template),
                Classification::NoMatch { best_score } => {
                    info!("No template matched (best score {})", best_score);
                    None
                }
            }
        }
    };

    let fields = match &template {
        Some(t) => extract_fields(text, t),
        None => InvoiceFieldSet::default(),
    };
    Ok(InvoiceRow::new(String::new(), fields, template.as_ref()))
}

/// Outcome of one document in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub date_range: Option<DateRange>,
    pub result: Result<DocumentOutput>,
}

/// Progress notification sent after each document.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    pub completed: usize,
    pub total: usize,
    pub name: &'a str,
    pub ok: bool,
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-document outcomes in processing order.
    pub items: Vec<BatchItem>,
    /// True when the batch stopped early.
    pub cancelled: bool,
}

impl BatchReport {
    /// All transactions in processing order, date-sorted when requested.
    pub fn transactions(&self, sort_by_date: bool) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self
            .items
            .iter()
            .filter_map(|item| match &item.result {
                Ok(DocumentOutput::Transactions(records)) => Some(records.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect();
        if sort_by_date {
            records.sort_by_key(|r| r.date);
        }
        records
    }

    pub fn invoices(&self) -> Vec<InvoiceRow> {
        self.items
            .iter()
            .filter_map(|item| match &item.result {
                Ok(DocumentOutput::Invoice(row)) => Some(row.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &FolioError)> {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().err().map(|e| (item.name.as_str(), e)))
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.result.is_ok()).count()
    }
}

/// Process documents one after another.
///
/// `load` opens a document by name; a load failure is recorded for that
/// document only. With `presort_by_date` every document is opened once
/// more beforehand to peek its date range.
pub fn process_batch<S, L, P>(
    names: &[String],
    load: L,
    session: &Session,
    token: &CancellationToken,
    mut on_progress: P,
) -> BatchReport
where
    S: FragmentSource,
    L: Fn(&str) -> Result<S>,
    P: FnMut(BatchProgress<'_>),
{
    let mut order: Vec<(String, Option<DateRange>)> = names.iter().map(|n| (n.clone(), None)).collect();

    if session.batch.presort_by_date {
        for (name, range) in order.iter_mut() {
            if token.is_cancelled() {
                break;
            }
            *range = match load(name.as_str()) {
                Ok(source) => peek_date_range(&source, &session.config.peek, session.threshold()),
                Err(e) => {
                    warn!("Could not peek {}: {}", name, e);
                    None
                }
            };
        }
        order.sort_by(|a, b| compare_ranges(&a.1, &b.1));
        debug!("Batch order after peek: {:?}", order.iter().map(|(n, _)| n).collect::<Vec<_>>());
    }

    let total = order.len();
    let mut report = BatchReport::default();

    for (name, date_range) in order {
        if token.is_cancelled() {
            info!("Batch cancelled after {} of {} documents", report.items.len(), total);
            report.cancelled = true;
            break;
        }

        let result = load(name.as_str()).and_then(|source| process_document(&source, session, token));
        let result = result.map(|output| match output {
            DocumentOutput::Invoice(mut row) => {
                row.file = name.clone();
                DocumentOutput::Invoice(row)
            }
            other => other,
        });

        match &result {
            Ok(_) => debug!("Processed {}", name),
            Err(FolioError::Cancelled) => report.cancelled = true,
            Err(e) => warn!("Failed to process {}: {}", name, e),
        }

        on_progress(BatchProgress {
            completed: report.items.len() + 1,
            total,
            name: &name,
            ok: result.is_ok(),
        });

        report.items.push(BatchItem {
            name,
            date_range,
            result,
        });

        if report.cancelled {
            break;
        }
    }

    info!(
        "Batch finished: {} of {} documents succeeded",
        report.succeeded(),
        total
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::layout::TextFragment;
    use crate::models::template::FieldKind;
    use crate::pdf::InMemorySource;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lines_page(lines: &[&str]) -> Page {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| TextFragment::new(*text, 10.0, 800.0 - 20.0 * i as f64))
            .collect()
    }

    fn flowing_session() -> Session {
        Session::new(
            FolioConfig::default(),
            DocumentKind::Statement(StatementFormat::Flowing),
        )
    }

    fn invoice_templates() -> Vec<Template> {
        vec![
            Template::new("acme")
                .with_export_name("ACME Trading Sdn Bhd")
                .with_pattern(FieldKind::SupplierName, r"(ACME \w+)")
                .with_pattern(FieldKind::DocumentNumber, r"Invoice No:\s*([\w\s-]+)"),
            Template::new("globex").with_pattern(FieldKind::SupplierName, "globex"),
        ]
    }

    #[test]
    fn test_cancellation_token_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(matches!(token.check(), Err(FolioError::Cancelled)));
    }

    #[test]
    fn test_flowing_document() {
        let source = InMemorySource::new(vec![lines_page(&["01 Jan 2024", "Coffee Shop RM 12.50"])]);
        let output = process_document(&source, &flowing_session(), &CancellationToken::new()).unwrap();

        match output {
            DocumentOutput::Transactions(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].description, "Coffee Shop");
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_tabular_document() {
        let session = Session::new(
            FolioConfig::default(),
            DocumentKind::Statement(StatementFormat::Tabular),
        );
        let source = InMemorySource::new(vec![lines_page(&[
            "STATEMENT DATE : 31/01/24",
            "ACCOUNT TRANSACTIONS",
            "01/02 GROCERY STORE 45.00-",
            "BAKI LEGAR",
        ])]);

        let output = process_document(&source, &session, &CancellationToken::new()).unwrap();
        let DocumentOutput::Transactions(records) = output else {
            panic!("expected transactions");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_string(), "01/02/2024");
        assert_eq!(records[0].amount_string(), "-45.00");
    }

    #[test]
    fn test_invoice_classified_then_extracted() {
        let session = Session::new(FolioConfig::default(), DocumentKind::Invoice)
            .with_templates(invoice_templates());
        let source = InMemorySource::new(vec![lines_page(&[
            "ACME Trading",
            "Invoice No: INV - 2024 - 001",
        ])]);

        let output = process_document(&source, &session, &CancellationToken::new()).unwrap();
        let DocumentOutput::Invoice(row) = output else {
            panic!("expected invoice");
        };
        assert_eq!(row.template_name.as_deref(), Some("acme"));
        assert_eq!(row.fields.document_number.as_deref(), Some("INV-2024-001"));
        assert_eq!(row.export_supplier_name(), Some("ACME Trading Sdn Bhd"));
    }

    #[test]
    fn test_invoice_without_match() {
        let session = Session::new(FolioConfig::default(), DocumentKind::Invoice)
            .with_templates(invoice_templates());
        let row = process_invoice_text("Initech receipt", &session).unwrap();
        assert_eq!(row.template_name, None);
        assert!(row.fields.is_empty());
    }

    #[test]
    fn test_active_template_skips_classification() {
        let session = Session::new(FolioConfig::default(), DocumentKind::Invoice)
            .with_templates(invoice_templates())
            .with_active_template("globex");
        let row = process_invoice_text("ACME Trading", &session).unwrap();
        assert_eq!(row.template_name.as_deref(), Some("globex"));
        assert_eq!(row.fields.supplier_name, None);

        let missing = Session::new(FolioConfig::default(), DocumentKind::Invoice).with_active_template("nope");
        assert!(matches!(
            process_invoice_text("x", &missing),
            Err(FolioError::Extraction(ExtractionError::UnknownTemplate(_)))
        ));
    }

    #[test]
    fn test_empty_document_has_no_text() {
        let source = InMemorySource::new(vec![Page::default()]);
        let result = process_document(&source, &flowing_session(), &CancellationToken::new());
        assert!(matches!(result, Err(FolioError::Extraction(ExtractionError::NoText))));
    }

    #[test]
    fn test_cancelled_before_pages() {
        let token = CancellationToken::new();
        token.cancel();
        let source = InMemorySource::new(vec![lines_page(&["01 Jan 2024 A RM 1.00"])]);
        assert!(matches!(
            process_document(&source, &flowing_session(), &token),
            Err(FolioError::Cancelled)
        ));
    }

    fn library() -> HashMap<String, InMemorySource> {
        let mut docs = HashMap::new();
        docs.insert(
            "march.pdf".to_string(),
            InMemorySource::new(vec![lines_page(&["05 Mar 2024 Rent RM 900.00"])]),
        );
        docs.insert(
            "january.pdf".to_string(),
            InMemorySource::new(vec![lines_page(&[
                "20 Jan 2024 Late RM 2.00",
                "02 Jan 2024 Early RM 1.00",
            ])]),
        );
        docs
    }

    fn load_from(docs: &HashMap<String, InMemorySource>) -> impl Fn(&str) -> Result<InMemorySource> + '_ {
        move |name: &str| {
            docs.get(name)
                .cloned()
                .ok_or_else(|| PdfError::Parse(format!("missing {}", name)).into())
        }
    }

    #[test]
    fn test_batch_presort_and_failure_isolation() {
        let docs = library();
        let names = vec![
            "march.pdf".to_string(),
            "broken.pdf".to_string(),
            "january.pdf".to_string(),
        ];
        let session = flowing_session().with_batch_options(BatchOptions {
            presort_by_date: true,
            sort_transactions: true,
        });

        let mut seen = Vec::new();
        let report = process_batch(&names, load_from(&docs), &session, &CancellationToken::new(), |p| {
            seen.push((p.completed, p.name.to_string(), p.ok))
        });

        let order: Vec<&str> = report.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(order, vec!["january.pdf", "march.pdf", "broken.pdf"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failures().count(), 1);
        assert!(!report.cancelled);
        assert_eq!(seen.last(), Some(&(3, "broken.pdf".to_string(), false)));

        let sorted: Vec<String> = report.transactions(true).iter().map(|r| r.description.clone()).collect();
        assert_eq!(sorted, vec!["Early", "Late", "Rent"]);

        let unsorted: Vec<String> = report.transactions(false).iter().map(|r| r.description.clone()).collect();
        assert_eq!(unsorted, vec!["Late", "Early", "Rent"]);
    }

    #[test]
    fn test_batch_stops_when_cancelled() {
        let docs = library();
        let names = vec!["march.pdf".to_string(), "january.pdf".to_string()];
        let token = CancellationToken::new();
        let canceller = token.clone();

        let report = process_batch(&names, load_from(&docs), &flowing_session(), &token, |_| canceller.cancel());

        assert_eq!(report.items.len(), 1);
        assert!(report.cancelled);
    }

    #[test]
    fn test_batch_sets_invoice_file_names() {
        let mut docs = HashMap::new();
        docs.insert(
            "inv.pdf".to_string(),
            InMemorySource::new(vec![lines_page(&["ACME Trading"])]),
        );
        let session = Session::new(FolioConfig::default(), DocumentKind::Invoice)
            .with_templates(invoice_templates());

        let report = process_batch(
            &["inv.pdf".to_string()],
            load_from(&docs),
            &session,
            &CancellationToken::new(),
            |_| {},
        );
        let rows = report.invoices();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file, "inv.pdf");
        assert_eq!(rows[0].template_name.as_deref(), Some("acme"));
    }
}
