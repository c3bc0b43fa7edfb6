use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::{Result, miette};
use nip_common::telemetry::{self, TelemetryConfig};
use nip_common::{Config, FileStore, NipError};
use nip_editor_core::markup::normalize;
use nip_editor_core::{RichTextEditor, StyleKind, TextRange};
use nip_renderer::{
    FieldId, PanelDraft, Product, Region, Template, TemplateSnapshot, render_page, render_panel,
    save_html, save_template,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(version, about = "NIP - nutrition information panel builder", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: $NIP_CONFIG, then ./nip.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Storage root, overriding the config file
    #[arg(long, value_name = "DIR", global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the panel markup for a draft
    Render {
        #[command(flatten)]
        draft: DraftArgs,

        /// Wrap the panel in the standalone page
        #[arg(long)]
        page: bool,
    },
    /// Render the page and store it under the draft's region
    Save {
        #[command(flatten)]
        draft: DraftArgs,

        /// Overwrite panels already stored for this product
        #[arg(long)]
        force: bool,
    },
    /// Store a timestamped snapshot of the draft
    SaveTemplate {
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Report which regions hold a panel for each identifier
    Check {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Print a stored panel
    Show {
        identifier: String,

        #[arg(long, default_value = "AU")]
        region: Region,
    },
    /// Toggle a style on a rich-text value and print the result
    Format {
        /// Field markup, e.g. "Hello <em>World</em>"
        markup: String,

        #[arg(long, default_value = "bold")]
        style: StyleKind,

        /// Char range of the plain text, `start..end`, or a caret offset
        #[arg(long, value_parser = parse_range)]
        range: Option<TextRange>,
    },
}

#[derive(Args)]
struct DraftArgs {
    /// Template snapshot to start from instead of the template defaults
    #[arg(long, value_name = "FILE")]
    from: Option<PathBuf>,

    /// Product title
    #[arg(long)]
    title: Option<String>,

    /// Online store URL, also the storage identifier
    #[arg(long)]
    url: Option<String>,

    #[arg(long)]
    template: Option<Template>,

    #[arg(long)]
    region: Option<Region>,

    /// Replace a rich-text field
    #[arg(long = "set", value_name = "FIELD=MARKUP")]
    fields: Vec<String>,
}

impl DraftArgs {
    async fn build(&self) -> Result<PanelDraft> {
        let mut draft = match &self.from {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(NipError::from)?;
                let snapshot: TemplateSnapshot =
                    serde_json::from_str(&raw).map_err(NipError::from)?;
                debug!(saved_at = %snapshot.saved_at, path = %path.display(), "loaded snapshot");
                let mut draft = snapshot.into_draft();
                if let Some(template) = self.template {
                    draft.template = template;
                }
                if let Some(title) = &self.title {
                    draft.product.title = title.clone();
                }
                draft
            }
            None => {
                let url = self
                    .url
                    .clone()
                    .ok_or_else(|| miette!("--url is required unless --from is given"))?;
                let title = self.title.clone().unwrap_or_else(|| url.clone());
                PanelDraft::for_template(Product::new(title, url), self.template.unwrap_or_default())
            }
        };

        if let Some(region) = self.region {
            draft.region = region;
        }
        for assignment in &self.fields {
            let (name, markup) = assignment
                .split_once('=')
                .ok_or_else(|| miette!("expected FIELD=MARKUP, got {assignment:?}"))?;
            let field: FieldId = name.parse()?;
            draft.on_change(field, normalize(markup));
        }
        Ok(draft)
    }
}

fn parse_range(s: &str) -> std::result::Result<TextRange, String> {
    let number = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid offset {part:?}: {e}"))
    };
    match s.split_once("..") {
        Some((start, end)) => Ok(TextRange::new(number(start)?, number(end)?)),
        None => Ok(TextRange::caret(number(s)?)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let (mut config, config_path) = Config::discover(cli.config.as_deref())?;
    telemetry::init(TelemetryConfig::from_env("nip").with_level(config.log.level.as_deref()));
    match &config_path {
        Some(path) => debug!(path = %path.display(), "loaded config"),
        None => debug!("no config file found, using defaults"),
    }
    if let Some(root) = cli.storage {
        config.storage.root = root;
    }
    let store = FileStore::new(&config.storage.root);

    match cli.command {
        Commands::Render { draft, page } => {
            let draft = draft.build().await?;
            let html = if page {
                render_page(&draft)
            } else {
                render_panel(&draft)
            };
            print!("{html}");
        }
        Commands::Save { draft, force } => {
            let draft = draft.build().await?;
            let saved = save_html(&store, &draft, force).await?;
            println!("✓ Saved {} ({})", saved.filename(), saved.region);
            println!("  Path: {}", saved.path.display());
            println!("  Access at: {}", saved.access_url());
        }
        Commands::SaveTemplate { draft } => {
            let draft = draft.build().await?;
            let path = save_template(&store, &draft).await?;
            println!("✓ Template saved: {}", path.display());
        }
        Commands::Check { identifiers } => {
            for identifier in identifiers {
                let status = store.status(&identifier).await?;
                let line = serde_json::json!({
                    "identifier": identifier,
                    "htmlStatus": status,
                });
                println!("{line}");
            }
        }
        Commands::Show { identifier, region } => {
            let html = store.read(region, &identifier).await?;
            print!("{html}");
        }
        Commands::Format {
            markup,
            style,
            range,
        } => {
            let mut editor = RichTextEditor::with_echo_window(&markup, config.editor.echo_window());
            if let Some(range) = range {
                editor.select_range(range)?;
            }
            let mut value = editor.value();
            let outcome = editor.toggle(style, &mut |v: String| value = v)?;
            info!(path = ?outcome.path, %style, "formatted");

            println!("{value}");
            if let Some(selected) = editor.selected_range() {
                println!("selection: {}..{}", selected.start, selected.end);
            }
        }
    }

    Ok(())
}

fn init_miette() {
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    miette::set_panic_hook();
}
