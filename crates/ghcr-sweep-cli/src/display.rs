//! Display formatting for CLI output

use chrono::{DateTime, Utc};
use console::style;
use ghcr_sweep_core::{
    DeletionStatus, LiveReason, LiveTags, LivenessPolicy, PackageVersion, ResolveFailure,
    SweepOutcome,
};

/// Shorten a digest for table output (`sha256:` prefix + 12 hex chars)
pub fn truncate_hash(digest: &str) -> &str {
    let cut = "sha256:".len() + 12;
    digest.get(..cut).unwrap_or(digest)
}

pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

fn join_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        style("<untagged>").dim().to_string()
    } else {
        tags.join(",")
    }
}

fn live_summary(live: &LiveTags) -> String {
    format!(
        "{} live tag(s): {} image, {} helm",
        live.len(),
        live.images.len(),
        live.helm.len()
    )
}

/// Print the resolve failures, then every deletion and the final tally
pub fn print_outcome(outcome: &SweepOutcome) {
    let report = &outcome.report;

    println!("{} {}", style("→").blue(), live_summary(&outcome.live));
    println!(
        "{} {} retained",
        style("→").blue(),
        pluralize(outcome.resolution.retained.len(), "digest", "digests")
    );

    if !outcome.resolution.failures.is_empty() {
        println!();
        for failure in &outcome.resolution.failures {
            print_failure(failure);
        }
    }

    if !report.deletions.is_empty() {
        println!();
    }
    for deletion in &report.deletions {
        let (icon, verb) = match &deletion.status {
            DeletionStatus::WouldDelete => (style("○").yellow(), "would delete".to_string()),
            DeletionStatus::Deleted => (style("✓").green(), "deleted".to_string()),
            DeletionStatus::Failed { message } => {
                (style("✗").red(), format!("failed: {}", message))
            }
        };
        println!(
            "  {} {:>10}  {}  {}  {}",
            icon,
            deletion.id,
            truncate_hash(&deletion.digest),
            join_tags(&deletion.tags),
            style(verb).dim()
        );
    }

    println!();
    let mode = if report.dry_run {
        style("[DRY RUN]").yellow().bold().to_string()
    } else {
        style("[LIVE]").red().bold().to_string()
    };
    let removed = if report.dry_run { "to delete" } else { "deleted" };
    println!(
        "{} {} total, {} kept, {} {}, {} failed",
        mode, report.total, report.kept, report.deleted, removed, report.failed
    );
}

fn print_failure(failure: &ResolveFailure) {
    let status = failure
        .status
        .map(|s| format!(" ({})", s))
        .unwrap_or_default();
    println!(
        "  {} {} tag {}{}: {}",
        style("⚠").yellow(),
        failure.track.as_str(),
        style(&failure.tag).cyan(),
        status,
        failure.message
    );
}

/// Print the inventory as a table, annotated with why each version is live
pub fn print_inventory(
    versions: &[PackageVersion],
    policy: &LivenessPolicy,
    now: DateTime<Utc>,
) {
    if versions.is_empty() {
        println!("No versions found");
        return;
    }

    println!(
        "{:>10}  {:<19}  {:<5}  {:<20}  {:<7}  {}",
        style("ID").bold(),
        style("DIGEST").bold(),
        style("KIND").bold(),
        style("UPDATED").bold(),
        style("LIVE").bold(),
        style("TAGS").bold()
    );

    for version in versions {
        let live = match policy.live_reason(version, now) {
            Some(LiveReason::Recent) => style(format!("{:<7}", "recent")).green(),
            Some(LiveReason::Pattern) => style(format!("{:<7}", "pattern")).cyan(),
            None => style(format!("{:<7}", "-")).dim(),
        };
        println!(
            "{:>10}  {:<19}  {:<5}  {:<20}  {}  {}",
            version.id,
            truncate_hash(version.digest()),
            version.kind().as_str(),
            version.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
            live,
            join_tags(version.tags())
        );
    }

    println!();
    println!("{}", pluralize(versions.len(), "version", "versions"));
}
