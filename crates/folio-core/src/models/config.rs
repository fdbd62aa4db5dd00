//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the folio pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Layout reconstruction configuration.
    pub layout: LayoutConfig,

    /// Statement grammar configuration.
    pub statement: StatementConfig,

    /// Template classification configuration.
    pub classification: ClassificationConfig,

    /// Date-range peek configuration.
    pub peek: PeekConfig,

    /// Template store configuration.
    pub templates: TemplateStoreConfig,
}

/// Layout reconstruction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance (in PDF units) beyond which a fragment starts a new
    /// line in flowing reconstruction.
    pub line_merge_threshold: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_merge_threshold: 5.0,
        }
    }
}

/// Statement grammar configuration.
///
/// Marker lists are matched case-insensitively as substrings of a trimmed
/// line unless noted otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementConfig {
    /// Lines that open the transaction block.
    pub block_start_markers: Vec<String>,

    /// Lines that close the transaction block.
    pub block_end_markers: Vec<String>,

    /// Column headers and separators skipped inside the block.
    pub header_markers: Vec<String>,

    /// Lines that discard the pending description without a record.
    pub nullifying_markers: Vec<String>,

    /// Boilerplate removed from tabular descriptions.
    pub boilerplate: Vec<String>,

    /// Currency markers recognised by the flowing grammar.
    pub currencies: Vec<String>,
}

impl Default for StatementConfig {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            block_start_markers: owned(&["ACCOUNT TRANSACTIONS", "URUSNIAGA AKAUN"]),
            block_end_markers: owned(&["ENDING BALANCE", "BAKI AKHIR", "BAKI LEGAR", "LEDGER BALANCE"]),
            header_markers: owned(&[
                "ENTRY DATE",
                "TARIKH MASUK",
                "TRANSACTION DESCRIPTION",
                "BUTIR URUSNIAGA",
                "TRANSACTION AMOUNT",
                "JUMLAH URUSNIAGA",
                "STATEMENT BALANCE",
                "BAKI PENYATA",
                "BEGINNING BALANCE",
                "BAKI PERMULAAN",
            ]),
            nullifying_markers: owned(&[
                "NO TRANSACTION",
                "TIADA URUSNIAGA",
                "TOTAL DEBIT",
                "TOTAL CREDIT",
                "JUMLAH DEBIT",
                "JUMLAH KREDIT",
                "BALANCE B/F",
                "BALANCE C/F",
            ]),
            boilerplate: owned(&[
                "TRANSFER FR A/C",
                "TRANSFER TO A/C",
                "PAYMENT FR A/C",
                "PAYMENT TO A/C",
                "FPX PAYMENT FR A/C",
                "PAYMENT VIA MYDEBIT",
                "MBB CT-",
                "IBG CREDIT",
                "DUITNOW QR",
            ]),
            currencies: owned(&["RM", "MYR"]),
        }
    }
}

/// Template classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Minimum score a template needs to be selected.
    pub min_score: u32,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self { min_score: 3 }
    }
}

/// Date-range peek configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeekConfig {
    /// Pages read from the start of the document.
    pub head_pages: usize,

    /// Pages read from the end of the document.
    pub tail_pages: usize,
}

impl Default for PeekConfig {
    fn default() -> Self {
        Self {
            head_pages: 3,
            tail_pages: 3,
        }
    }
}

/// Template store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateStoreConfig {
    /// JSON file holding saved templates. `None` uses the platform default.
    pub store_path: Option<PathBuf>,
}

impl FolioConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
