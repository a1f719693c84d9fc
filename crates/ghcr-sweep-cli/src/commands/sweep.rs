//! Sweep command - delete every version no live tag reaches

use ghcr_sweep_core::sweep;

use super::TargetArgs;
use crate::display;
use crate::error::{CliError, Result};

/// Run one collection pass
pub async fn run(target: &TargetArgs, strict: bool, output_json: bool) -> Result<()> {
    let mut config = target.to_config()?;
    if strict {
        config.abort_on_resolve_failure = true;
    }

    tracing::debug!("Resolved configuration: {:?}", config);

    let outcome = sweep::run_remote(&config).await?;

    if output_json {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", json);
    } else {
        display::print_outcome(&outcome);
    }

    if outcome.report.has_failures() {
        tracing::warn!(
            "{} deletion(s) failed; they will be retried on the next run",
            outcome.report.failed
        );
    }

    Ok(())
}
