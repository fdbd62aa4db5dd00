//! Classify command - score an invoice against the template library.

use std::path::PathBuf;

use clap::Args;
use console::style;

use folio_core::layout::reconstruct_text;
use folio_core::pipeline::load_pages;
use folio_core::{CancellationToken, Classification, PdfFragmentSource, TemplateClassifier, TemplateStore};

use super::{load_config, open_store};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Minimum score for a match (overrides the config)
    #[arg(long)]
    min_score: Option<u32>,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let templates = open_store(&config).list()?;

    if templates.is_empty() {
        anyhow::bail!("No templates saved. Add one with 'folio templates add'.");
    }

    let source = PdfFragmentSource::open(&args.input)?;
    let pages = load_pages(&source, &CancellationToken::new())?;
    let text = reconstruct_text(&pages, config.layout.line_merge_threshold);

    let classifier = TemplateClassifier::new(args.min_score.unwrap_or(config.classification.min_score));
    let scores = classifier.score_all(&text, &templates);

    if scores.is_empty() {
        println!("{} No template pattern matched", style("ℹ").blue());
    } else {
        println!("{:<30} {:>5}", style("Template").bold(), style("Score").bold());
        for score in &scores {
            println!("{:<30} {:>5}", score.template_name, score.score);
        }
        println!();
    }

    match classifier.classify(&text, &templates) {
        Classification::Matched { template, score } => {
            println!(
                "{} Selected template: {} (score {})",
                style("✓").green(),
                style(&template.name).cyan(),
                score
            );
        }
        Classification::NoMatch { best_score } => {
            println!(
                "{} No template reached the minimum score of {} (best {})",
                style("⚠").yellow(),
                classifier.min_score(),
                best_score
            );
        }
    }

    Ok(())
}
