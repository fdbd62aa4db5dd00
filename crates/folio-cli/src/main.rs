//! CLI application for bank statement and invoice extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, classify, config, extract, peek, templates};

/// Folio - Extract transactions and invoice fields from PDF documents
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records from a single document
    Extract(extract::ExtractArgs),

    /// Extract records from many documents into one export
    Batch(batch::BatchArgs),

    /// Score an invoice against the template library
    Classify(classify::ClassifyArgs),

    /// Show the date range of documents without full extraction
    Peek(peek::PeekArgs),

    /// Manage invoice templates
    Templates(templates::TemplatesArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Classify(args) => classify::run(args, config_path).await,
        Commands::Peek(args) => peek::run(args, config_path).await,
        Commands::Templates(args) => templates::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
