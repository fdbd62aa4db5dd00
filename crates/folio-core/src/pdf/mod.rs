//! Page fragment sources.
//!
//! The grammars only need positioned text per page. A [`FragmentSource`]
//! yields exactly that, one page at a time, so callers can check for
//! cancellation between pages.

#[cfg(feature = "native")]
mod extractor;

#[cfg(feature = "native")]
pub use extractor::PdfFragmentSource;

use crate::error::PdfError;
use crate::layout::Page;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Anything that can produce positioned text fragments page by page.
pub trait FragmentSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Fragments of one page (0-based index).
    fn page_fragments(&self, index: usize) -> Result<Page>;
}

impl<S: FragmentSource + ?Sized> FragmentSource for &S {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_fragments(&self, index: usize) -> Result<Page> {
        (**self).page_fragments(index)
    }
}

/// Pages that were already decoded elsewhere (a browser renderer, a test).
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pages: Vec<Page>,
}

impl InMemorySource {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }
}

impl From<Vec<Page>> for InMemorySource {
    fn from(pages: Vec<Page>) -> Self {
        Self::new(pages)
    }
}

impl FragmentSource for InMemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_fragments(&self, index: usize) -> Result<Page> {
        self.pages
            .get(index)
            .cloned()
            .ok_or(PdfError::InvalidPage(index))
    }
}
