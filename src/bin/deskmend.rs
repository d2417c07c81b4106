// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use deskmend::{path::default_settings_path, Layout, Repairer, Settings};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{fs::read_to_string, io::ErrorKind, path::PathBuf, process::exit};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  deskmend [options] <deskmend-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Check(opts) => run_check(opts),
            Command::Config(opts) => run_config(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Repair desktop entries pointing at stale program paths.
    #[command(override_usage = "deskmend check [options]")]
    Check(CheckOptions),

    /// Show effective directory layout.
    #[command(override_usage = "deskmend config [options]")]
    Config(ConfigOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CheckOptions {
    /// Report what would be repaired without writing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Path to settings file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ConfigOptions {
    /// Path to settings file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_check(opts: CheckOptions) -> Result<()> {
    let layout = resolve_layout(opts.config)?;
    Repairer::new(layout).dry_run(opts.dry_run).run_check()?;

    Ok(())
}

fn run_config(opts: ConfigOptions) -> Result<()> {
    let layout = resolve_layout(opts.config)?;
    print!("{}", Settings::from(&layout));

    Ok(())
}

/// Load settings file, and resolve directory layout from it.
///
/// A missing settings file is fine, defaults are used instead. An explicitly
/// requested settings file must exist.
fn resolve_layout(config: Option<PathBuf>) -> Result<Layout> {
    let explicit = config.is_some();
    let path = match config {
        Some(path) => path,
        None => default_settings_path()?,
    };

    let settings = match read_to_string(&path) {
        Ok(data) => data
            .parse::<Settings>()
            .with_context(|| format!("invalid settings file {:?}", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound && !explicit => {
            debug!("no settings file at {:?}, using defaults", path.display());
            Settings::default()
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file {:?}", path.display()));
        }
    };

    Ok(Layout::resolve(&settings)?)
}
