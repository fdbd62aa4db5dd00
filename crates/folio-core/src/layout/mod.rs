//! Layout reconstruction from positioned text fragments.
//!
//! Two strategies turn an unordered page of fragments into reading order:
//! - line grouping for tabular documents, one string per rounded y
//! - streaming accumulation for flowing documents, breaking on y jumps

mod lines;

pub use lines::{
    group_lines, group_page_lines, reconstruct_page_lines, reconstruct_page_text, reconstruct_text,
};

use serde::{Deserialize, Serialize};

/// Default vertical distance that separates two flowing lines.
pub const DEFAULT_LINE_THRESHOLD: f64 = 5.0;

/// One positioned run of characters on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Characters in this run.
    pub text: String,
    /// Horizontal position (PDF units, left to right).
    pub x: f64,
    /// Vertical position (PDF units, bottom to top).
    pub y: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }

    /// Build a fragment from a 2D affine transform `[a, b, c, d, e, f]`,
    /// taking the translation components as position.
    pub fn from_transform(text: impl Into<String>, transform: &[f64; 6]) -> Self {
        Self::new(text, transform[4], transform[5])
    }
}

/// All fragments of one page, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub fragments: Vec<TextFragment>,
}

impl Page {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }
}

impl From<Vec<TextFragment>> for Page {
    fn from(fragments: Vec<TextFragment>) -> Self {
        Self::new(fragments)
    }
}

impl FromIterator<TextFragment> for Page {
    fn from_iter<I: IntoIterator<Item = TextFragment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
