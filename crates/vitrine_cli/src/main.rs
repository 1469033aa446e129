//! Vitrine CLI
//!
//! Loads themes through the same store, cache and client the storefront
//! uses, and prints the resulting style variables or accessibility report.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vitrine_theme::config::CONFIG_FILE_NAME;
use vitrine_theme::EngineConfig;

/// Storefront theme engine tools
#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(about = "Load, inspect and audit storefront themes")]
#[command(version)]
struct Args {
    /// Engine config file (or a directory containing vitrine.toml)
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a theme through the store and print its style variables
    Load {
        slug: String,
        /// Serve from the built-in presets instead of the theme service
        #[arg(long)]
        offline: bool,
    },
    /// Print the style variables for a descriptor file
    Vars { file: PathBuf },
    /// WCAG contrast report for a theme slug or descriptor file
    Report {
        target: String,
        #[arg(long)]
        offline: bool,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the built-in presets
    Presets,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = EngineConfig::load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let output = match args.command {
        Command::Load { slug, offline } => commands::load(&config, &slug, offline).await?,
        Command::Vars { file } => commands::vars(&file)?,
        Command::Report {
            target,
            offline,
            json,
        } => commands::report(&config, &target, offline, json).await?,
        Command::Presets => commands::presets(),
    };

    println!("{output}");
    Ok(())
}
