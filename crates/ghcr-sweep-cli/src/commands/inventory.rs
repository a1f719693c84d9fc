//! Inventory command - list package versions and their liveness

use chrono::Utc;
use ghcr_sweep_core::{GitHubPackages, LiveReason, LivenessPolicy, PackageApi};
use serde::Serialize;

use super::TargetArgs;
use crate::display;
use crate::error::{CliError, Result};

#[derive(Serialize)]
struct InventoryEntry<'a> {
    id: u64,
    digest: &'a str,
    tags: &'a [String],
    kind: &'static str,
    updated_at: String,
    live: Option<LiveReason>,
}

/// List every version of the package without touching the registry
pub async fn run(target: &TargetArgs, output_json: bool) -> Result<()> {
    let config = target.to_config()?;
    let policy = LivenessPolicy::from_config(&config)?;
    let api = GitHubPackages::new(&config)?;

    let versions = api.list_versions().await?;
    let now = Utc::now();

    if output_json {
        let entries: Vec<InventoryEntry<'_>> = versions
            .iter()
            .map(|v| InventoryEntry {
                id: v.id,
                digest: v.digest(),
                tags: v.tags(),
                kind: v.kind().as_str(),
                updated_at: v.timestamp().to_rfc3339(),
                live: policy.live_reason(v, now),
            })
            .collect();
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    display::print_inventory(&versions, &policy, now);
    Ok(())
}
