//! # whisk-cli
//!
//! Conflict-aware, cache-accelerated pip installs.
//!
//! This is the entry point for the `whisk` binary. It parses arguments,
//! sets up logging and error handling, and dispatches to the command
//! handlers. The install command drives the whole engine: requirements
//! parsing, graph expansion, conflict detection, and installation.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::error;

mod commands;
mod installer;
mod output;
mod venv;

use commands::CommandContext;
use whisk_core::error::WhiskResult;

/// Conflict-aware, cache-accelerated pip installs
#[derive(Parser)]
#[command(name = "whisk", version, about = "Fast, conflict-aware dependency installation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install requirements into the target environment
    Install {
        /// Requirement specifiers, wheel URLs, or `-e` editable sources
        packages: Vec<String>,

        /// Requirements files (expanded inline, top to bottom)
        #[arg(short = 'r', long = "requirement")]
        requirements: Vec<String>,

        /// Target virtualenv directory
        #[arg(long)]
        venv: Option<String>,

        /// Primary package index URL
        #[arg(short = 'i', long = "index-url")]
        index_url: Option<String>,

        /// Additional index URLs, consulted after the primary
        #[arg(long = "extra-index-url")]
        extra_index_urls: Vec<String>,
    },
    /// Prune unused wheels from the shared cache
    Clean {
        /// Remove wheels unused for more than this many days
        #[arg(long, default_value_t = 30)]
        max_age_days: i64,
    },
    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    match run_cli(cli) {
        Ok(code) => code,
        Err(e) => {
            let formatter = output::ErrorFormatter::new();
            eprintln!("{}", formatter.format_error(&e));
            error!("command failed: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> WhiskResult<ExitCode> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| whisk_core::error::WhiskError::Io {
        message: "Failed to create async runtime".to_string(),
        source: e,
    })?;

    rt.block_on(async {
        let ctx = CommandContext::new()?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "whisk={level},whisk_core={level},whisk_index={level},whisk_resolver={level},whisk_cache={level}",
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("whisk encountered an unexpected error: {}", panic_info);
        eprintln!("whisk crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/whisk-py/whisk/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
