//! Positioned text extraction using lopdf.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Encoding, Object, ObjectId};
use tracing::{debug, trace};

use super::{FragmentSource, Result};
use crate::error::PdfError;
use crate::layout::{Page, TextFragment};

/// Affine matrix `[a, b, c, d, e, f]` in PDF row-vector convention.
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// TJ adjustments below this (thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f64 = -200.0;

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(out)
}

/// Decode a PDF string without font information: UTF-16BE when it carries
/// a BOM, Latin-1 otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Font encodings of one page, keyed by resource name (`F1`).
struct PageFonts<'a> {
    encodings: BTreeMap<Vec<u8>, Encoding<'a>>,
}

impl<'a> PageFonts<'a> {
    fn load(document: &'a Document, page_id: ObjectId) -> Self {
        let fonts = match document.get_page_fonts(page_id) {
            Ok(fonts) => fonts,
            Err(e) => {
                debug!("No font resources for page {:?}: {}", page_id, e);
                BTreeMap::new()
            }
        };

        let encodings = fonts
            .into_iter()
            .filter_map(|(name, font)| match font.get_font_encoding(document) {
                Ok(encoding) => Some((name, encoding)),
                Err(e) => {
                    debug!("Font {} has no usable encoding: {}", String::from_utf8_lossy(&name), e);
                    None
                }
            })
            .collect();

        Self { encodings }
    }

    /// Decode a shown string through the named font, falling back to
    /// [`decode_pdf_string`] when the font is unknown or cannot map it.
    fn decode(&self, font: Option<&[u8]>, bytes: &[u8]) -> String {
        if bytes.starts_with(&[0xFE, 0xFF]) {
            return decode_pdf_string(bytes);
        }

        let decoded = font
            .and_then(|name| self.encodings.get(name))
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok());
        match decoded {
            Some(text) if !text.is_empty() => text,
            _ => decode_pdf_string(bytes),
        }
    }

    /// Text of a TJ array, with wide negative adjustments read as spaces.
    fn decode_array(&self, font: Option<&[u8]>, items: &[Object]) -> String {
        let mut text = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => text.push_str(&self.decode(font, bytes)),
                other => {
                    if number(other).is_some_and(|adj| adj < TJ_SPACE_THRESHOLD) && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
            }
        }
        text
    }
}

/// Graphics and text state while walking one content stream.
struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    leading: f64,
    /// Resource name from the last `Tf`; persists across text objects.
    font: Option<Vec<u8>>,
    fragments: Vec<TextFragment>,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            saved: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            leading: 0.0,
            font: None,
            fragments: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        let position = multiply(&self.text_matrix, &self.ctm);
        self.fragments
            .push(TextFragment::from_transform(text, &position));
    }

    fn apply(&mut self, op: &Operation, fonts: &PageFonts) {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    self.leading = leading;
                }
            }
            "Tf" => {
                if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                    self.font = Some(name.to_vec());
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = fonts.decode(self.font.as_deref(), bytes);
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text = fonts.decode_array(self.font.as_deref(), items);
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = fonts.decode(self.font.as_deref(), bytes);
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = fonts.decode(self.font.as_deref(), bytes);
                    self.show(text);
                }
            }
            _ => {}
        }
    }
}

/// Fragment source reading a PDF's text layer.
pub struct PdfFragmentSource {
    document: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfFragmentSource {
    /// Parse a PDF from memory. Documents encrypted with an empty user
    /// password are decrypted.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_ids.len());
        Ok(Self { document, page_ids })
    }

    /// Read and parse a PDF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::load(&data)
    }
}

impl FragmentSource for PdfFragmentSource {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_fragments(&self, index: usize) -> Result<Page> {
        let page_id = *self.page_ids.get(index).ok_or(PdfError::InvalidPage(index))?;

        let raw = self
            .document
            .get_page_content(page_id)
            .map_err(|e| PdfError::ContentDecode {
                page: index,
                reason: e.to_string(),
            })?;
        let content = Content::decode(&raw).map_err(|e| PdfError::ContentDecode {
            page: index,
            reason: e.to_string(),
        })?;

        let fonts = PageFonts::load(&self.document, page_id);
        let mut state = TextState::new();
        for op in &content.operations {
            state.apply(op, &fonts);
        }

        trace!("Page {}: {} fragments", index, state.fragments.len());
        Ok(Page::new(state.fragments))
    }
}
