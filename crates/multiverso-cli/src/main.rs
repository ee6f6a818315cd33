//! Multiverso - browse the Rick and Morty character catalog from the terminal.
//!
//! Works online against the public API and falls back to the locally cached
//! snapshot when the network is unavailable.

mod commands;
mod format;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use multiverso_core::{AppContext, CharacterFilters, CharacterId, CharacterStatus, Config, Theme};

/// Log file written inside the data directory
const LOG_FILE: &str = "multiverso.log";

#[derive(Parser)]
#[command(name = "multiverso")]
#[command(about = "Rick and Morty character catalog that keeps working offline", long_about = None)]
struct Cli {
    /// Skip the connectivity check and serve everything from the cache
    #[arg(long, global = true)]
    offline: bool,

    /// Mirror logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List characters, page by page
    Browse {
        /// alive, dead or unknown
        #[arg(short, long)]
        status: Option<CharacterStatus>,

        /// Name search (online only)
        #[arg(short, long)]
        name: Option<String>,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one character and its first episodes
    Show { id: CharacterId },
    /// Manage favorite characters
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },
    /// Total, alive and dead counts
    Stats,
    /// Show or change the theme
    Theme { mode: Option<ThemeArg> },
    /// Delete favorites, theme and cached characters
    ClearAll,
    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum FavoritesCommand {
    List,
    Add { id: CharacterId },
    Remove { id: CharacterId },
    Toggle { id: CharacterId },
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

/// Initialize the tracing subscriber for logging
///
/// Logs go to a file in the data directory so command output stays clean.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(data_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(data_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(verbose.then(|| fmt::layer().with_writer(io::stderr)))
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if cli.offline {
        config.start_offline = true;
    }

    let _guard = init_tracing(&config.data_dir()?, cli.verbose)?;
    info!("Multiverso starting");

    let mut ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Browse { status, name, pages } => {
            let filters = CharacterFilters { status, name };
            commands::browse(&ctx, filters, pages).await?
        }
        Commands::Show { id } => commands::show(&ctx, id).await?,
        Commands::Favorites { action } => match action {
            FavoritesCommand::List => commands::list_favorites(&ctx).await,
            FavoritesCommand::Add { id } => {
                ctx.favorites.add(id);
                println!("Added {} to favorites", id);
            }
            FavoritesCommand::Remove { id } => {
                ctx.favorites.remove(id);
                println!("Removed {} from favorites", id);
            }
            FavoritesCommand::Toggle { id } => {
                if ctx.favorites.toggle(id) {
                    println!("Added {} to favorites", id);
                } else {
                    println!("Removed {} from favorites", id);
                }
            }
            FavoritesCommand::Clear => {
                ctx.favorites.clear();
                println!("Favorites cleared");
            }
        },
        Commands::Stats => commands::stats(&ctx).await,
        Commands::Theme { mode } => {
            let theme = match mode {
                None => ctx.preferences.theme(),
                Some(ThemeArg::Light) => {
                    ctx.preferences.set_theme(Theme::Light);
                    ctx.preferences.theme()
                }
                Some(ThemeArg::Dark) => {
                    ctx.preferences.set_theme(Theme::Dark);
                    ctx.preferences.theme()
                }
                Some(ThemeArg::Toggle) => ctx.preferences.toggle_theme(),
            };
            println!("Theme: {}", theme);
        }
        Commands::ClearAll => {
            ctx.clear_all();
            println!("Favorites, theme and cached characters deleted");
        }
        Commands::Config { save } => commands::print_config(&ctx.config, save)?,
    }

    info!("Multiverso shutting down");
    Ok(())
}
