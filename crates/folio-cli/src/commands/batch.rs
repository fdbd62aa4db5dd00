//! Batch command - many documents into one export.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use folio_core::export::{invoices_to_csv, transactions_to_csv};
use folio_core::pipeline::BatchProgress;
use folio_core::{
    process_batch, BatchOptions, CancellationToken, DateRange, DocumentKind, DocumentOutput,
    FolioError, PdfFragmentSource, Session, TemplateStore,
};

use super::{expand_pdfs, load_config, open_store, write_output, KindArg, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern (e.g. "statements/*.pdf")
    #[arg(required = true)]
    input: String,

    /// Document kind
    #[arg(short, long, value_enum, default_value = "flowing")]
    kind: KindArg,

    /// Invoice template to use instead of classifying
    #[arg(short, long)]
    template: Option<String>,

    /// Peek date ranges first and process oldest documents first; also
    /// sorts the combined transactions by date
    #[arg(long)]
    sort_by_date: bool,

    /// Stop at the first document that fails and write nothing
    #[arg(long)]
    fail_fast: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Per-document entry of the JSON report.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportEntry<'a> {
    file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a DocumentOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = expand_pdfs(&args.input)?;
    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let kind: DocumentKind = args.kind.into();
    let mut session = Session::new(config, kind).with_batch_options(BatchOptions {
        presort_by_date: args.sort_by_date,
        sort_transactions: args.sort_by_date,
    });
    if kind == DocumentKind::Invoice {
        session.templates = open_store(&session.config).list()?;
        if let Some(name) = &args.template {
            session = session.with_active_template(name.clone());
        }
    }

    let names: Vec<String> = files.iter().map(|p| p.to_string_lossy().into_owned()).collect();

    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let fail_fast = args.fail_fast;
    let batch_token = token.clone();
    let batch_pb = pb.clone();
    let batch_session = session.clone();
    let report = tokio::task::spawn_blocking(move || {
        process_batch(
            &names,
            |name: &str| PdfFragmentSource::open(name).map_err(FolioError::from),
            &batch_session,
            &batch_token,
            |progress: BatchProgress<'_>| {
                batch_pb.set_position(progress.completed as u64);
                batch_pb.set_message(progress.name.to_string());
                if !progress.ok && fail_fast {
                    batch_token.cancel();
                }
            },
        )
    })
    .await?;

    pb.finish_and_clear();

    // Summary
    let failures: Vec<(&str, &FolioError)> = report
        .failures()
        .filter(|(_, e)| !matches!(e, FolioError::Cancelled))
        .collect();
    for (name, error) in &failures {
        eprintln!("{} {}: {}", style("✗").red(), name, error);
    }
    eprintln!(
        "{} Processed {}/{} files successfully in {:.2}s",
        if failures.is_empty() { style("✓").green() } else { style("⚠").yellow() },
        report.succeeded(),
        files.len(),
        start.elapsed().as_secs_f64()
    );

    if fail_fast {
        if let Some((name, error)) = failures.first() {
            anyhow::bail!("Failed to process {}: {}", name, error);
        }
    }
    if report.succeeded() == 0 && !failures.is_empty() {
        anyhow::bail!("None of the {} files could be processed", files.len());
    }
    if report.cancelled {
        warn!("Batch was cancelled, writing partial results");
    }

    let content = match (kind, args.format) {
        (DocumentKind::Invoice, OutputFormat::Csv) => invoices_to_csv(&report.invoices())?,
        (DocumentKind::Statement(_), OutputFormat::Csv) => {
            transactions_to_csv(&report.transactions(session.batch.sort_transactions))?
        }
        (_, OutputFormat::Json) => {
            let entries: Vec<ReportEntry<'_>> = report
                .items
                .iter()
                .map(|item| ReportEntry {
                    file: &item.name,
                    date_range: item.date_range,
                    output: item.result.as_ref().ok(),
                    error: item.result.as_ref().err().map(|e| e.to_string()),
                })
                .collect();
            serde_json::to_string_pretty(&entries)? + "\n"
        }
    };

    write_output(args.output.as_deref(), &content)?;

    debug!("Total batch time: {:?}", start.elapsed());
    Ok(())
}
