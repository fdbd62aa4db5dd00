//! Extract command - records from a single document.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use folio_core::export::{invoices_to_csv, transactions_to_csv};
use folio_core::{
    process_document, CancellationToken, DocumentOutput, PdfFragmentSource, Session, TemplateStore,
};

use super::{load_config, open_store, write_output, KindArg, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Document kind
    #[arg(short, long, value_enum, default_value = "flowing")]
    kind: KindArg,

    /// Invoice template to use instead of classifying
    #[arg(short, long)]
    template: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mut session = Session::new(config, args.kind.into());
    if matches!(args.kind, KindArg::Invoice) {
        session.templates = open_store(&session.config).list()?;
        if let Some(name) = &args.template {
            session = session.with_active_template(name.clone());
        }
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message("Reading PDF...");

    let source = PdfFragmentSource::open(&args.input)?;
    pb.set_message("Extracting...");
    let output = process_document(&source, &session, &CancellationToken::new())?;
    pb.finish_and_clear();

    let content = match (output, args.format) {
        (DocumentOutput::Transactions(records), OutputFormat::Csv) => transactions_to_csv(&records)?,
        (DocumentOutput::Transactions(records), OutputFormat::Json) => {
            serde_json::to_string_pretty(&records)? + "\n"
        }
        (DocumentOutput::Invoice(mut row), format) => {
            row.file = args
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match format {
                OutputFormat::Csv => invoices_to_csv(&[row])?,
                OutputFormat::Json => serde_json::to_string_pretty(&row)? + "\n",
            }
        }
    };

    write_output(args.output.as_deref(), &content)?;

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}
