mod app;
mod clock;
mod config;
mod dom;
mod effects;
mod error;
mod field;
mod nav;
mod observe;
mod panel;
mod render;
mod rings;
mod schedule;
mod site;
mod types;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{config::Settings, error::FxError};

/// Portfolio page effects, running in the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file overriding the built-in settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the particle field
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (the terminal itself is taken by the page)
    #[arg(long)]
    log: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<(), FxError> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log {
        init_logging(path)?;
    }
    let settings = Settings::load(cli.config.as_deref())?;
    tracing::info!(config = ?cli.config, seed = ?cli.seed, "starting");
    ui::run(settings, cli.seed)?;
    Ok(())
}
