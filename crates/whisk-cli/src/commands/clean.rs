//! `whisk clean`: wheel cache housekeeping.

use std::process::ExitCode;

use whisk_cache::WheelStore;
use whisk_config::Settings;
use whisk_core::error::WhiskResult;

use super::CommandContext;

/// Execute the `whisk clean` command
pub async fn execute(max_age_days: i64, ctx: &CommandContext) -> WhiskResult<ExitCode> {
    let settings = Settings::load(&ctx.cwd)?;
    let store = WheelStore::new(&settings.cache_dir)?;

    let corrupt = store.verify()?;
    for filename in &corrupt {
        ctx.output
            .warn(&format!("cached wheel failed verification: {}", filename));
    }

    let result = store.prune(max_age_days)?;
    ctx.output.success(&format!(
        "Removed {} wheels, freed {}",
        result.entries_removed,
        result.format_freed_space()
    ));

    Ok(ExitCode::SUCCESS)
}
