//! # DSAKit CLI (`dsakit`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dsakit init` | Create the SQLite catalog and the workspace root |
//! | `dsakit ingest <url>` | Build a workspace for a problem page |
//! | `dsakit list` | List ingested problems |
//! | `dsakit open <id>` | Open a problem's workspace in the editor |
//! | `dsakit serve` | Start the local HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! dsakit ingest https://leetcode.com/problems/two-sum/
//! dsakit ingest https://leetcode.com/problems/3sum/ --pseudo-code-file ./idea.txt --no-launch
//! dsakit --config ./config/dsakit.toml serve
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use dsakit::catalog::{CatalogStore, SqliteCatalog};
use dsakit::config::{self, Config};
use dsakit::launcher;
use dsakit::migrate;
use dsakit::pipeline::Pipeline;
use dsakit::progress::ProgressMode;
use dsakit::server;

const DEFAULT_CONFIG: &str = "./config/dsakit.toml";

/// DSAKit: turn a problem page into a ready-to-code workspace.
#[derive(Parser)]
#[command(
    name = "dsakit",
    about = "DSAKit: turn a competitive-programming problem page into a ready-to-code workspace",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When the default path does not exist, built-in defaults are used.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Gemini API key. Defaults to the variable named by `codegen.api_key_env`.
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the catalog database and the workspace root.
    ///
    /// Idempotent. Also reports whether the packaged assets are in place.
    Init,

    /// Build a workspace for a problem URL.
    ///
    /// Fetches the page, extracts the problem, generates starter code,
    /// materializes the workspace, opens it in the editor, and records it.
    Ingest {
        /// Problem URL, e.g. `https://leetcode.com/problems/two-sum/`.
        url: String,

        /// Pseudocode to pass to the generator.
        #[arg(long, conflicts_with = "pseudo_code_file")]
        pseudo_code: Option<String>,

        /// Read pseudocode from a file.
        #[arg(long)]
        pseudo_code_file: Option<PathBuf>,

        /// Do not open the workspace in the editor.
        #[arg(long)]
        no_launch: bool,

        /// Progress output on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a terminal.
        #[arg(long)]
        progress: Option<String>,
    },

    /// List ingested problems, most recent first.
    List,

    /// Open an ingested problem's workspace in the editor.
    Open {
        /// Problem id as recorded in the catalog.
        id: String,
    },

    /// Start the local HTTP API.
    ///
    /// Binds to `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = resolve_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            std::fs::create_dir_all(&cfg.workspace.root).with_context(|| {
                format!(
                    "Failed to create workspace root: {}",
                    cfg.workspace.root.display()
                )
            })?;
            println!("Database initialized successfully.");
            println!("  catalog:   {}", cfg.db.path.display());
            println!("  workspace: {}", cfg.workspace.root.display());
            report_asset("prompt template", &cfg.prompt.template);
            report_asset("template archive", &cfg.workspace.template_archive);
        }
        Commands::Ingest {
            url,
            pseudo_code,
            pseudo_code_file,
            no_launch,
            progress,
        } => {
            let pseudo_code = match (pseudo_code, pseudo_code_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path).with_context(|| {
                    format!("Failed to read pseudocode file: {}", path.display())
                })?,
                (None, None) => String::new(),
            };
            let mode = match progress {
                Some(value) => match ProgressMode::parse(&value) {
                    Some(mode) => mode,
                    None => bail!("Unknown progress mode: '{}'. Use off, human, or json.", value),
                },
                None => ProgressMode::default_for_tty(),
            };
            if no_launch {
                cfg.pipeline.launch_editor = false;
            }

            let api_key = resolve_api_key(&cli.api_key, &cfg);
            let catalog = SqliteCatalog::open(&cfg.db.path).await?;
            let pipeline = Pipeline::from_config(&cfg, Arc::new(catalog.clone()), api_key)?
                .with_reporter(Arc::from(mode.reporter()));

            let entry = pipeline.ingest(&url, &pseudo_code).await?;
            catalog.close().await;

            println!("ingest {}", entry.url);
            println!("  id: {}", entry.id);
            println!("  title: {}", entry.title);
            println!("  workspace: {}", entry.workspace_path);
            println!("ok");
        }
        Commands::List => {
            let catalog = SqliteCatalog::open(&cfg.db.path).await?;
            let entries = catalog.list().await?;
            catalog.close().await;

            if entries.is_empty() {
                println!("No workspaces yet. Try `dsakit ingest <url>`.");
            } else {
                println!("{:<8} {:<40} {:<20} WORKSPACE", "ID", "TITLE", "UPDATED");
                for entry in entries {
                    println!(
                        "{:<8} {:<40} {:<20} {}",
                        entry.id,
                        truncate(&entry.title, 40),
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.workspace_path
                    );
                }
            }
        }
        Commands::Open { id } => {
            let catalog = SqliteCatalog::open(&cfg.db.path).await?;
            let entry = catalog.get(&id).await?;
            catalog.close().await;

            let Some(entry) = entry else {
                bail!("No workspace recorded for problem id '{}'", id);
            };
            launcher::launch_editor(&cfg.editor, Path::new(&entry.workspace_path))?;
            println!("opened {}", entry.workspace_path);
        }
        Commands::Serve => {
            let api_key = resolve_api_key(&cli.api_key, &cfg);
            server::run_server(&cfg, api_key).await?;
        }
    }

    Ok(())
}

/// Load `path`, or fall back to defaults when the default path is absent.
fn resolve_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG) {
        info!(config = %path.display(), "config file not found, using defaults");
        return Ok(Config::minimal());
    }
    config::load_config(path)
}

fn resolve_api_key(flag: &Option<String>, cfg: &Config) -> String {
    flag.clone()
        .or_else(|| cfg.codegen.api_key_from_env())
        .unwrap_or_default()
}

fn report_asset(label: &str, path: &Path) {
    let status = if path.is_file() { "ok" } else { "MISSING" };
    println!("  {:<17} {} ({})", format!("{}:", label), path.display(), status);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
