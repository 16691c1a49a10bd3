//! Command implementations and dispatch logic.

use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

pub mod clean;
pub mod install;


use crate::output::OutputHandler;
use crate::Commands;
use whisk_core::error::{WhiskError, WhiskResult};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: PathBuf,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a new command context
    pub fn new() -> WhiskResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| WhiskError::Io {
            message: "Failed to get current directory".to_string(),
            source: e,
        })?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
        })
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> WhiskResult<ExitCode> {
    match command {
        Commands::Install {
            packages,
            requirements,
            venv,
            index_url,
            extra_index_urls,
        } => {
            info!("installing {} packages, {} files", packages.len(), requirements.len());
            install::execute(
                install::InstallOptions {
                    packages,
                    requirements,
                    venv,
                    index_url,
                    extra_index_urls,
                },
                ctx,
            )
            .await
        },
        Commands::Clean { max_age_days } => {
            info!("cleaning wheels unused for {} days", max_age_days);
            clean::execute(max_age_days, ctx).await
        },
        Commands::Version => show_version(ctx),
    }
}

fn show_version(ctx: &CommandContext) -> WhiskResult<ExitCode> {
    let version = env!("CARGO_PKG_VERSION");
    let build_date = env!("BUILD_DATE");
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.plain(&format!("whisk v{}", version));
    ctx.output.plain(&format!("Built: {}", build_date));
    ctx.output.plain(&format!("Target: {}", target));
    ctx.output.plain(&format!("Rust: {}", env!("RUSTC_VERSION")));

    Ok(ExitCode::SUCCESS)
}
