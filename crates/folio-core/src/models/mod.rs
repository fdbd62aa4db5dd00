//! Data models shared across the pipeline.

pub mod config;
pub mod record;
pub mod template;

pub use config::FolioConfig;
pub use record::TransactionRecord;
pub use template::{FieldKind, InvoiceFieldSet, Template};
