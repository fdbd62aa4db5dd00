//! Templates command - manage the invoice template library.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use folio_core::{FieldKind, Template, TemplateStore};

use super::{load_config, open_store};

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List saved templates
    List,

    /// Show one template as JSON
    Show {
        /// Template name
        name: String,
    },

    /// Add or replace a template
    Add(AddArgs),

    /// Remove a template
    Remove {
        /// Template name
        name: String,
    },

    /// Show the template store path
    Path,
}

#[derive(Args)]
struct AddArgs {
    /// Template name (ignored with --file)
    #[arg(required_unless_present = "file")]
    name: Option<String>,

    /// Read the template from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["supplier", "date", "number", "total", "export_name"])]
    file: Option<PathBuf>,

    /// Supplier name pattern
    #[arg(long)]
    supplier: Option<String>,

    /// Document date pattern
    #[arg(long)]
    date: Option<String>,

    /// Document number pattern
    #[arg(long)]
    number: Option<String>,

    /// Total amount pattern
    #[arg(long)]
    total: Option<String>,

    /// Supplier name written to exports
    #[arg(long)]
    export_name: Option<String>,
}

pub async fn run(args: TemplatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut store = open_store(&config);

    match args.command {
        TemplatesCommand::List => {
            let templates = store.list()?;
            if templates.is_empty() {
                println!("{} No templates saved", style("ℹ").blue());
            }
            for template in templates {
                let fields: Vec<&str> = FieldKind::ALL
                    .iter()
                    .filter(|k| template.pattern(**k).is_some())
                    .map(|k| k.label())
                    .collect();
                println!("{}  [{}]", style(&template.name).cyan(), fields.join(", "));
            }
        }
        TemplatesCommand::Show { name } => {
            let template = store.get(&name)?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        TemplatesCommand::Add(add) => {
            let template = build_template(add)?;

            let errors = template.validate();
            if !errors.is_empty() {
                for error in &errors {
                    eprintln!("{} {}", style("✗").red(), error);
                }
                anyhow::bail!("Template {} has {} invalid pattern(s)", template.name, errors.len());
            }

            let name = template.name.clone();
            store.put(template)?;
            println!("{} Saved template {}", style("✓").green(), name);
        }
        TemplatesCommand::Remove { name } => {
            store.remove(&name)?;
            println!("{} Removed template {}", style("✓").green(), name);
        }
        TemplatesCommand::Path => {
            println!("Template store: {}", store.path().display());
        }
    }

    Ok(())
}

fn build_template(args: AddArgs) -> anyhow::Result<Template> {
    if let Some(path) = args.file {
        let content = std::fs::read_to_string(&path)?;
        return Ok(serde_json::from_str(&content)?);
    }

    let name = args
        .name
        .ok_or_else(|| anyhow::anyhow!("A template name is required"))?;
    let mut template = Template::new(name);
    let patterns = [
        (FieldKind::SupplierName, args.supplier),
        (FieldKind::DocumentDate, args.date),
        (FieldKind::DocumentNumber, args.number),
        (FieldKind::TotalAmount, args.total),
    ];
    for (kind, pattern) in patterns {
        if let Some(pattern) = pattern {
            template = template.with_pattern(kind, pattern);
        }
    }
    if let Some(export_name) = args.export_name {
        template = template.with_export_name(export_name);
    }
    Ok(template)
}
