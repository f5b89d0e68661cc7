//! CLI command definitions using Clap.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use colored::Colorize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use super::output;
use crate::config::{self, LoadedConfig};
use crate::constants::APP_NAME;
use crate::error::TesseraError;
use crate::mosaic::catalog::list_covers;
use crate::mosaic::{DesktopBackground, DetachedDesktop, Engine, SystemDesktop};

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tessera - a living mosaic wallpaper built from your cover images.
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless `TESSERA_LOG` or `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the mosaic until interrupted (default).
    ///
    /// Paints every tile once, then keeps refreshing a few tiles at a time
    /// with a random pause between cycles. Ctrl-C waits for the current
    /// cycle to finish before exiting.
    Run {
        /// Write the wallpaper file but leave the desktop background alone.
        #[arg(long)]
        no_apply: bool,
    },

    /// Paint every tile once, write and apply the wallpaper, then exit.
    Once {
        /// Write the wallpaper file but leave the desktop background alone.
        #[arg(long)]
        no_apply: bool,
    },

    /// Print the cover images found in the configured folder as JSON.
    Covers,

    /// Print the tile grid computed from the configured size.
    Layout,

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support
    /// JSON Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(tessera completions --shell zsh)"
    ///   tessera completions --shell fish > ~/.config/fish/completions/tessera.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<&Path> { self.config.as_deref() }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable or the command fails.
    pub fn execute(&self) -> Result<(), TesseraError> {
        match self.command.as_ref().unwrap_or(&Commands::Run { no_apply: false }) {
            Commands::Run { no_apply } => {
                let loaded = self.load_config()?;
                block_on(run_until_interrupted(&loaded, *no_apply))
            }
            Commands::Once { no_apply } => {
                let loaded = self.load_config()?;
                block_on(run_once(&loaded, *no_apply))
            }
            Commands::Covers => {
                let loaded = self.load_config()?;
                let covers = list_covers(&loaded.config.folder_path())?;
                let paths: Vec<String> =
                    covers.iter().map(|path| path.display().to_string()).collect();
                output::print_highlighted_json(&serde_json::json!(paths));
                Ok(())
            }
            Commands::Layout => {
                let loaded = self.load_config()?;
                print_layout(&loaded);
                Ok(())
            }
            Commands::Schema => {
                println!("{}", config::schema::generate_schema_json());
                Ok(())
            }
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    fn load_config(&self) -> Result<LoadedConfig, TesseraError> {
        Ok(config::load(self.config_path())?)
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, APP_NAME, &mut io::stdout());
    }
}

fn desktop(no_apply: bool) -> Arc<dyn DesktopBackground> {
    if no_apply { Arc::new(DetachedDesktop) } else { Arc::new(SystemDesktop) }
}

fn block_on<F>(future: F) -> Result<(), TesseraError>
where F: Future<Output = Result<(), TesseraError>> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(future)
}

async fn run_until_interrupted(loaded: &LoadedConfig, no_apply: bool) -> Result<(), TesseraError> {
    let engine = Engine::new(loaded.config.engine_settings(), desktop(no_apply));
    tracing::info!(config = %loaded.path.display(), "configuration loaded");
    engine.start();

    let interrupted = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
    engine.stop().await;

    interrupted?;
    Ok(())
}

async fn run_once(loaded: &LoadedConfig, no_apply: bool) -> Result<(), TesseraError> {
    let engine = Engine::new(loaded.config.engine_settings(), desktop(no_apply));
    let outcome = engine.run_cycle_now().await;
    engine.stop().await;

    if let Some(report) = outcome? {
        let tiles = engine.settings().rows * engine.settings().cols;
        println!(
            "{} {} of {tiles} tiles painted into {}",
            "✓".green(),
            report.updated.len(),
            report.output.display()
        );
        if report.exhausted {
            println!("{}", "Not enough covers to fill every tile.".yellow());
        }
        if !no_apply && !report.applied {
            println!("{}", "The desktop background could not be set.".yellow());
        }
    }
    Ok(())
}

#[derive(Tabled)]
struct TileRow {
    #[tabled(rename = "Tile")]
    index: usize,
    #[tabled(rename = "Row")]
    row: u32,
    #[tabled(rename = "Col")]
    col: u32,
    #[tabled(rename = "X")]
    x: u32,
    #[tabled(rename = "Y")]
    y: u32,
    #[tabled(rename = "Size")]
    size: String,
}

fn layout_rows(loaded: &LoadedConfig) -> Vec<TileRow> {
    let settings = loaded.config.engine_settings();
    let plan = settings.grid();
    let cols = settings.cols.max(1);

    plan.tiles
        .iter()
        .zip(0_u32..)
        .enumerate()
        .map(|(index, (rect, n))| TileRow {
            index,
            row: n / cols,
            col: n % cols,
            x: rect.x,
            y: rect.y,
            size: format!("{}x{}", rect.width, rect.height),
        })
        .collect()
}

fn print_layout(loaded: &LoadedConfig) {
    let config = &loaded.config;
    let plan = loaded.config.engine_settings().grid();
    let rows = layout_rows(loaded);

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(0..5)).with(Alignment::right()))
        .to_string();

    println!(
        "{}",
        format!(
            "Layout {}x{} on {}x{} (tile {}px, gap {}px x {}px)",
            config.rows, config.cols, config.width, config.height, plan.tile_size, plan.gap_x, plan.gap_y
        )
        .bold()
    );
    println!("{table}");
}
