//! Deletion of versions outside the retention set

use serde::Serialize;

use crate::github::PackageApi;
use crate::package::PackageVersion;
use crate::retention::RetentionSet;

/// Versions split into keep and delete
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepPlan {
    pub keep: Vec<PackageVersion>,
    pub delete: Vec<PackageVersion>,
}

impl SweepPlan {
    /// Partition `versions` by membership of their digest in `retained`
    pub fn new(versions: Vec<PackageVersion>, retained: &RetentionSet) -> Self {
        let (keep, delete): (Vec<_>, Vec<_>) = versions
            .into_iter()
            .partition(|v| retained.contains(v.digest()));
        Self { keep, delete }
    }

    pub fn total(&self) -> usize {
        self.keep.len() + self.delete.len()
    }
}

/// Result of one deletion attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum DeletionStatus {
    /// Dry run; no call was made
    WouldDelete,
    Deleted,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub id: u64,
    pub digest: String,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub status: DeletionStatus,
}

/// Final tally of a sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub dry_run: bool,
    /// Versions inventoried
    pub total: usize,
    pub kept: usize,
    /// Deleted, or would be deleted in a dry run
    pub deleted: usize,
    pub failed: usize,
    pub deletions: Vec<DeletionOutcome>,
}

impl SweepReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Issues deletions for a plan
pub struct Collector<'a, A: PackageApi + ?Sized> {
    api: &'a A,
    dry_run: bool,
}

impl<'a, A: PackageApi + ?Sized> Collector<'a, A> {
    pub fn new(api: &'a A, dry_run: bool) -> Self {
        Self { api, dry_run }
    }

    /// Delete every planned version, one call each
    ///
    /// A failed deletion is logged and counted; the remaining versions are
    /// still processed.
    pub async fn execute(&self, plan: &SweepPlan) -> SweepReport {
        let mut report = SweepReport {
            dry_run: self.dry_run,
            total: plan.total(),
            kept: plan.keep.len(),
            ..Default::default()
        };

        for version in &plan.delete {
            let label = describe(version);
            let status = if self.dry_run {
                tracing::info!("[DRY RUN] would delete {}", label);
                DeletionStatus::WouldDelete
            } else {
                match self.api.delete_version(version.id).await {
                    Ok(()) => {
                        tracing::info!("Deleted {}", label);
                        DeletionStatus::Deleted
                    }
                    Err(e) => {
                        tracing::error!("Failed to delete {}: {}", label, e);
                        DeletionStatus::Failed {
                            message: e.to_string(),
                        }
                    }
                }
            };

            match status {
                DeletionStatus::Failed { .. } => report.failed += 1,
                _ => report.deleted += 1,
            }
            report.deletions.push(DeletionOutcome {
                id: version.id,
                digest: version.digest().to_string(),
                tags: version.tags().to_vec(),
                status,
            });
        }

        tracing::info!(
            "Total: {}, kept: {}, {}: {}, failed: {}",
            report.total,
            report.kept,
            if self.dry_run { "would delete" } else { "deleted" },
            report.deleted,
            report.failed
        );
        report
    }
}

fn describe(version: &PackageVersion) -> String {
    if version.is_untagged() {
        format!("version {} ({}, untagged)", version.id, version.digest())
    } else {
        format!(
            "version {} ({}, tags: {})",
            version.id,
            version.digest(),
            version.tags().join(", ")
        )
    }
}
