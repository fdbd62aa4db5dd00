//! WASM bindings for bank statement and invoice extraction.
//!
//! The browser renders PDFs with pdf.js and passes the text content items
//! of each page (`{ str, transform }`) to these functions.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use folio_core::export::transactions_to_csv;
use folio_core::invoice::extract_fields;
use folio_core::layout::{self, DEFAULT_LINE_THRESHOLD};
use folio_core::models::config::StatementConfig;
use folio_core::{
    ClassificationScore, FlowingGrammar, Page, TabularGrammar, Template, TemplateClassifier, TextFragment,
    TransactionRecord,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// A pdf.js text content item. Marked-content items carry no `str` or
/// `transform` and are skipped.
#[derive(Debug, Deserialize)]
struct TextItem {
    #[serde(default)]
    str: String,
    #[serde(default)]
    transform: Option<[f64; 6]>,
}

fn to_pages(items: Vec<Vec<TextItem>>) -> Vec<Page> {
    items
        .into_iter()
        .map(|page| {
            page.into_iter()
                .filter_map(|item| {
                    item.transform
                        .map(|t| TextFragment::from_transform(item.str, &t))
                })
                .collect()
        })
        .collect()
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn pages_from_js(pages: JsValue) -> Result<Vec<Page>, JsValue> {
    Ok(to_pages(from_js(pages)?))
}

/// Tabular line reconstruction: one string per rounded y, all pages.
#[wasm_bindgen]
pub fn reconstruct_lines(pages: JsValue) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    to_js(&layout::group_lines(&pages))
}

/// Flowing text reconstruction. `threshold` defaults to 5 units.
#[wasm_bindgen]
pub fn reconstruct_text(pages: JsValue, threshold: Option<f64>) -> Result<String, JsValue> {
    let pages = pages_from_js(pages)?;
    Ok(layout::reconstruct_text(
        &pages,
        threshold.unwrap_or(DEFAULT_LINE_THRESHOLD),
    ))
}

/// Parse reconstructed tabular lines into `{ Date, Description, Amount }`
/// records.
#[wasm_bindgen]
pub fn parse_tabular_statement(lines: JsValue) -> Result<JsValue, JsValue> {
    let lines: Vec<String> = from_js(lines)?;
    let records = TabularGrammar::new(&StatementConfig::default()).parse(&lines);
    to_js(&records)
}

/// Parse reconstructed flowing text into `{ Date, Description, Amount }`
/// records.
#[wasm_bindgen]
pub fn parse_flowing_statement(text: &str) -> Result<JsValue, JsValue> {
    to_js(&FlowingGrammar::default().parse(text))
}

/// Records as CSV text.
#[wasm_bindgen]
pub fn export_transactions_csv(records: JsValue) -> Result<String, JsValue> {
    let records: Vec<TransactionRecord> = from_js(records)?;
    transactions_to_csv(&records).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract invoice fields with one template. Invalid patterns yield null
/// fields.
#[wasm_bindgen]
pub fn extract_invoice_fields(text: &str, template: JsValue) -> Result<JsValue, JsValue> {
    let template: Template = from_js(template)?;
    to_js(&extract_fields(text, &template))
}

/// Parse a template library in the CLI store format (a JSON array) and
/// report invalid patterns as `{ templates, errors }`.
#[wasm_bindgen]
pub fn import_templates(json: &str) -> Result<JsValue, JsValue> {
    let templates: Vec<Template> =
        serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let errors: Vec<String> = templates
        .iter()
        .flat_map(|t| t.validate())
        .map(|e| e.to_string())
        .collect();
    to_js(&ImportResult { templates, errors })
}

/// Serialize templates to the CLI store format.
#[wasm_bindgen]
pub fn export_templates(templates: JsValue) -> Result<String, JsValue> {
    let templates: Vec<Template> = from_js(templates)?;
    serde_json::to_string_pretty(&templates).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[derive(Serialize)]
struct ImportResult {
    templates: Vec<Template>,
    errors: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyResult {
    scores: Vec<ClassificationScore>,
    template: Option<String>,
    score: u32,
}

/// Score text against templates and pick the best one. `min_score`
/// defaults to 3.
#[wasm_bindgen]
pub fn classify_document(text: &str, templates: JsValue, min_score: Option<u32>) -> Result<JsValue, JsValue> {
    let templates: Vec<Template> = from_js(templates)?;
    let classifier = match min_score {
        Some(min) => TemplateClassifier::new(min),
        None => TemplateClassifier::default(),
    };

    let scores = classifier.score_all(text, &templates);
    let result = match classifier.classify(text, &templates) {
        folio_core::Classification::Matched { template, score } => ClassifyResult {
            scores,
            template: Some(template.name),
            score,
        },
        folio_core::Classification::NoMatch { best_score } => ClassifyResult {
            scores,
            template: None,
            score: best_score,
        },
    };
    to_js(&result)
}
