//! Error types for the folio-core library.

use thiserror::Error;

/// Main error type for the folio library.
#[derive(Error, Debug)]
pub enum FolioError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// A template pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Template store error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Record or field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// CSV export error.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Processing was cancelled by the caller.
    #[error("processing cancelled")]
    Cancelled,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to decode a page's content stream.
    #[error("failed to decode page {page}: {reason}")]
    ContentDecode { page: usize, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page index requested.
    #[error("invalid page index: {0}")]
    InvalidPage(usize),
}

/// A user-authored pattern that could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid pattern for {field}: {pattern:?}: {reason}")]
pub struct PatternError {
    /// Field the pattern was meant to extract.
    pub field: String,
    /// The pattern as written.
    pub pattern: String,
    /// Compiler message.
    pub reason: String,
}

/// Errors related to the template store.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template with this name.
    #[error("template not found: {0}")]
    NotFound(String),

    /// A template must have a non-empty name.
    #[error("template name is empty")]
    EmptyName,

    /// The backing store could not be read or written.
    #[error("template store I/O: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store holds malformed data.
    #[error("template store format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors related to record extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The document produced no text at all.
    #[error("document has no text layer")]
    NoText,

    /// The active template is not in the session.
    #[error("active template not loaded: {0}")]
    UnknownTemplate(String),
}

/// Result type for the folio library.
pub type Result<T> = std::result::Result<T, FolioError>;
