//! Sweep pipeline: inventory, classify, resolve, collect

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collector::{Collector, SweepPlan, SweepReport};
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::github::{GitHubPackages, PackageApi};
use crate::liveness::{LiveTags, LivenessPolicy, classify};
use crate::registry::{ManifestSource, RegistryClient};
use crate::resolver::{ManifestResolver, Resolution};

/// Everything a sweep computed, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub live: LiveTags,
    pub resolution: Resolution,
    pub report: SweepReport,
}

/// Run one sweep against the given API and registry
///
/// Keep patterns are compiled before any network call, and a failed
/// inventory page aborts before anything is resolved or deleted. Manifest
/// failures are tolerated unless `abort_on_resolve_failure` is set.
pub async fn run<A, S>(
    config: &SweepConfig,
    api: &A,
    registry: &S,
    now: DateTime<Utc>,
) -> Result<SweepOutcome>
where
    A: PackageApi + ?Sized,
    S: ManifestSource + ?Sized,
{
    let policy = LivenessPolicy::from_config(config)?;

    tracing::info!(
        "Sweeping {}/{} ({}, window {} day(s), {} keep pattern(s))",
        config.owner,
        config.package,
        if config.dry_run { "dry run" } else { "live" },
        config.retention_days,
        policy.patterns.len()
    );

    let versions = api.list_versions().await?;
    let live = classify(&versions, &policy, now);
    let resolution = ManifestResolver::new(registry).resolve(&live).await;

    if !resolution.is_complete() {
        if config.abort_on_resolve_failure {
            return Err(SweepError::UnsafeToCollect {
                failures: resolution.failures.len(),
            });
        }
        tracing::warn!(
            "{} live tag(s) did not resolve; digests they reference are not protected",
            resolution.failures.len()
        );
    }

    let plan = SweepPlan::new(versions, &resolution.retained);
    let report = Collector::new(api, config.dry_run).execute(&plan).await;

    Ok(SweepOutcome {
        live,
        resolution,
        report,
    })
}

/// Run one sweep against GitHub Packages and ghcr.io as configured
pub async fn run_remote(config: &SweepConfig) -> Result<SweepOutcome> {
    config.validate()?;
    let api = GitHubPackages::new(config)?;
    let registry = RegistryClient::new(config)?;
    run(config, &api, &registry, Utc::now()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::tests::FakePackages;
    use crate::package::PackageVersion;
    use crate::registry::Manifest;
    use crate::resolver::tests::FakeRegistry;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn config() -> SweepConfig {
        SweepConfig::new("acme", "operator", "t")
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let api = FakePackages {
            versions: vec![
                PackageVersion::new(1, "sha256:latest", now()).with_tags(["latest"]),
                PackageVersion::new(2, "sha256:amd64", now() - Duration::days(1)),
                PackageVersion::new(3, "sha256:snap", now() - Duration::days(730))
                    .with_tags(["snapshot"]),
                PackageVersion::new(4, "sha256:orphan", now() - Duration::days(90)),
            ],
            ..Default::default()
        };
        let registry = FakeRegistry::default()
            .with("latest", Manifest::index("sha256:latest", ["sha256:amd64"]))
            .with("snapshot", Manifest::leaf("sha256:snap"));

        let outcome = run(&config(), &api, &registry, now()).await.unwrap();

        assert!(outcome.resolution.retained.contains("sha256:latest"));
        assert!(outcome.resolution.retained.contains("sha256:amd64"));
        assert!(outcome.resolution.retained.contains("sha256:snap"));
        assert_eq!(outcome.report.total, 4);
        assert_eq!(outcome.report.kept, 3);
        assert_eq!(outcome.report.deleted, 1);
        assert_eq!(outcome.report.deletions[0].id, 4);
        // Dry run by default
        assert!(api.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_live_mode_deletes_unreferenced() {
        let api = FakePackages {
            versions: vec![
                PackageVersion::new(1, "sha256:AAA", now()).with_tags(["v1"]),
                PackageVersion::new(2, "sha256:ZZZ", now() - Duration::days(60))
                    .with_tags(["old"]),
            ],
            ..Default::default()
        };
        let registry = FakeRegistry::default().with("v1", Manifest::leaf("sha256:AAA"));
        let mut config = config();
        config.dry_run = false;

        let outcome = run(&config, &api, &registry, now()).await.unwrap();
        assert_eq!(*api.deleted.lock().unwrap(), vec![2]);
        assert_eq!(outcome.report.kept, 1);
        assert_eq!(outcome.report.deleted, 1);
    }

    #[tokio::test]
    async fn test_helm_chart_and_signature_survive() {
        let api = FakePackages {
            versions: vec![
                PackageVersion::new(1, "sha256:DDD", now())
                    .with_description("Helm chart")
                    .with_tags(["chart-1.0"]),
                PackageVersion::new(2, "sha256:EEE", now()).with_tags(["sha256-DDD"]),
                PackageVersion::new(3, "sha256:FFF", now()),
            ],
            ..Default::default()
        };
        let registry = FakeRegistry::default()
            .with("chart-1.0", Manifest::leaf("sha256:DDD"))
            .with("sha256-DDD", Manifest::index("sha256:EEE", ["sha256:FFF"]));

        let outcome = run(&config(), &api, &registry, now()).await.unwrap();
        assert_eq!(outcome.report.kept, 3);
        assert_eq!(outcome.report.deleted, 0);
    }

    #[tokio::test]
    async fn test_invalid_pattern_fails_before_listing() {
        struct Unreachable;

        #[async_trait]
        impl PackageApi for Unreachable {
            async fn list_versions(&self) -> Result<Vec<PackageVersion>> {
                panic!("inventory must not be fetched");
            }

            async fn delete_version(&self, _id: u64) -> Result<()> {
                panic!("nothing may be deleted");
            }
        }

        let mut config = config();
        config.keep_patterns = vec!["snapshot-(".to_string()];
        let err = run(&config, &Unreachable, &FakeRegistry::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_inventory_failure_is_fatal() {
        struct Failing;

        #[async_trait]
        impl PackageApi for Failing {
            async fn list_versions(&self) -> Result<Vec<PackageVersion>> {
                Err(SweepError::InventoryPage {
                    page: 2,
                    status: 500,
                    message: "boom".to_string(),
                })
            }

            async fn delete_version(&self, _id: u64) -> Result<()> {
                panic!("nothing may be deleted");
            }
        }

        let registry = FakeRegistry::default();
        let err = run(&config(), &Failing, &registry, now()).await.unwrap_err();
        assert!(matches!(err, SweepError::InventoryPage { page: 2, .. }));
        assert!(registry.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_tag_leaves_digest_unprotected() {
        let api = FakePackages {
            versions: vec![PackageVersion::new(1, "sha256:AAA", now()).with_tags(["v1"])],
            ..Default::default()
        };
        let registry = FakeRegistry::default().broken("v1", 503);

        let outcome = run(&config(), &api, &registry, now()).await.unwrap();
        assert_eq!(outcome.resolution.failures.len(), 1);
        assert_eq!(outcome.report.deleted, 1);
    }

    #[tokio::test]
    async fn test_abort_on_resolve_failure() {
        let api = FakePackages {
            versions: vec![PackageVersion::new(1, "sha256:AAA", now()).with_tags(["v1"])],
            ..Default::default()
        };
        let registry = FakeRegistry::default().broken("v1", 503);
        let mut config = config();
        config.dry_run = false;
        config.abort_on_resolve_failure = true;

        let err = run(&config, &api, &registry, now()).await.unwrap_err();
        assert!(matches!(err, SweepError::UnsafeToCollect { failures: 1 }));
        assert!(api.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_remote_validates_config() {
        let err = run_remote(&SweepConfig::new("acme", "operator", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfig { .. }));
    }
}
