//! Core library for financial document extraction.
//!
//! This crate provides:
//! - Layout reconstruction from positioned PDF text fragments
//! - Bank statement grammars (tabular and flowing layouts)
//! - Template-driven invoice field extraction and classification
//! - Date-range peeking for batch ordering
//! - CSV export

pub mod dates;
pub mod error;
pub mod export;
pub mod invoice;
pub mod layout;
pub mod models;
pub mod pdf;
pub mod peek;
pub mod pipeline;
pub mod statement;
pub mod store;

pub use error::{FolioError, Result};
pub use invoice::{Classification, ClassificationScore, InvoiceRow, TemplateClassifier};
pub use layout::{Page, TextFragment};
pub use models::{FieldKind, FolioConfig, InvoiceFieldSet, Template, TransactionRecord};
pub use pdf::{FragmentSource, InMemorySource};
#[cfg(feature = "native")]
pub use pdf::PdfFragmentSource;
pub use peek::DateRange;
pub use pipeline::{
    process_batch, process_document, BatchOptions, BatchReport, CancellationToken, DocumentKind,
    DocumentOutput, Session,
};
pub use statement::{FlowingGrammar, StatementFormat, TabularGrammar};
pub use store::{JsonTemplateStore, MemoryTemplateStore, TemplateStore};
