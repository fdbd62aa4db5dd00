//! Peek command - date range of each document from a few pages.

use clap::Args;
use console::style;
use tracing::warn;

use folio_core::models::record::DATE_FORMAT;
use folio_core::peek::{compare_ranges, peek_date_range};
use folio_core::PdfFragmentSource;

use super::{expand_pdfs, load_config};

/// Arguments for the peek command.
#[derive(Args)]
pub struct PeekArgs {
    /// Input glob pattern
    #[arg(required = true)]
    input: String,

    /// Pages read from the start of each document (overrides the config)
    #[arg(long)]
    head: Option<usize>,

    /// Pages read from the end of each document (overrides the config)
    #[arg(long)]
    tail: Option<usize>,
}

pub async fn run(args: PeekArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut peek = config.peek.clone();
    if let Some(head) = args.head {
        peek.head_pages = head;
    }
    if let Some(tail) = args.tail {
        peek.tail_pages = tail;
    }

    let files = expand_pdfs(&args.input)?;
    let mut ranges = Vec::with_capacity(files.len());

    for path in files {
        let range = match PdfFragmentSource::open(&path) {
            Ok(source) => peek_date_range(&source, &peek, config.layout.line_merge_threshold),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                None
            }
        };
        ranges.push((path, range));
    }

    ranges.sort_by(|a, b| compare_ranges(&a.1, &b.1));

    for (path, range) in &ranges {
        match range {
            Some(r) => println!(
                "{} - {}  {}",
                r.start.format(DATE_FORMAT),
                r.end.format(DATE_FORMAT),
                path.display()
            ),
            None => println!("{:<23}  {}", style("(no dates)").dim(), path.display()),
        }
    }

    Ok(())
}
