//! Subcommands and the helpers they share.

pub mod batch;
pub mod classify;
pub mod config;
pub mod extract;
pub mod peek;
pub mod templates;

use std::path::{Path, PathBuf};

use glob::glob;
use tracing::debug;

use folio_core::models::config::FolioConfig;
use folio_core::{DocumentKind, JsonTemplateStore, StatementFormat};

/// Document kind selected on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum KindArg {
    /// Statement with fixed columns and signed amounts
    Tabular,
    /// Statement whose records wrap across lines
    Flowing,
    /// Invoice, extracted with a template
    Invoice,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Tabular => DocumentKind::Statement(StatementFormat::Tabular),
            KindArg::Flowing => DocumentKind::Statement(StatementFormat::Flowing),
            KindArg::Invoice => DocumentKind::Invoice,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV output
    Csv,
    /// JSON output
    Json,
}

fn folio_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
}

pub fn default_config_path() -> PathBuf {
    folio_config_dir().join("config.json")
}

pub fn default_store_path() -> PathBuf {
    folio_config_dir().join("templates.json")
}

/// Config file in effect: the `--config` path if given, else the default.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load the config. An explicit path must exist; the default path is
/// optional and falls back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FolioConfig> {
    if let Some(path) = config_path {
        return Ok(FolioConfig::from_file(Path::new(path))?);
    }
    let path = default_config_path();
    if path.exists() {
        debug!("Using config {}", path.display());
        Ok(FolioConfig::from_file(&path)?)
    } else {
        Ok(FolioConfig::default())
    }
}

pub fn open_store(config: &FolioConfig) -> JsonTemplateStore {
    let path = config
        .templates
        .store_path
        .clone()
        .unwrap_or_else(default_store_path);
    debug!("Template store at {}", path.display());
    JsonTemplateStore::new(path)
}

/// Expand a glob into PDF paths, in glob order.
pub fn expand_pdfs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            ext.eq_ignore_ascii_case("pdf")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching PDF files found for pattern: {}", pattern);
    }
    Ok(files)
}

/// Write to a file, or to stdout when no path is given.
pub fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, content)?;
            eprintln!(
                "{} Output written to {}",
                console::style("✓").green(),
                path.display()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}
