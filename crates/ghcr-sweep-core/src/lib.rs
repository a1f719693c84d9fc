//! ghcr-sweep core
//!
//! Reachability-based garbage collection for a container package on
//! GitHub Container Registry. A run has three phases:
//!
//! - **Inventory**: list every package version through the GitHub Packages
//!   API, following pagination. A failed page aborts the run.
//! - **Reachability**: pick the live tags (recent, or matching a keep
//!   pattern) and trace each one through the registry to the digests it
//!   references, including multi-arch index entries and Helm chart
//!   signatures.
//! - **Collection**: delete every version whose digest was not reached.
//!   Dry run is the default.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ghcr_sweep_core::{SweepConfig, sweep};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SweepConfig::new("acme", "operator", std::env::var("GITHUB_TOKEN")?);
//! let outcome = sweep::run_remote(&config).await?;
//! println!("would delete {} version(s)", outcome.report.deleted);
//! # Ok(())
//! # }
//! ```
//!
//! ## Known gap
//!
//! A live tag whose manifest cannot be fetched contributes nothing to the
//! retention set, so a transient registry error can leave an in-use image
//! unprotected. Set `abort_on_resolve_failure` to refuse deletion in that
//! case.

pub mod error;
pub mod config;
pub mod client;
pub mod package;
pub mod github;
pub mod registry;
pub mod liveness;
pub mod retention;
pub mod resolver;
pub mod collector;
pub mod sweep;

// Re-exports for convenience
pub use error::{Result, SweepError};
pub use config::{KeepPatterns, PolicyFile, RepoType, SweepConfig, parse_patterns};
pub use package::{ArtifactKind, PackageVersion};
pub use github::{GitHubPackages, PackageApi};
pub use registry::{Descriptor, Manifest, ManifestSource, RegistryClient};
pub use liveness::{LiveReason, LiveTags, LivenessPolicy, classify};
pub use retention::RetentionSet;
pub use resolver::{ManifestResolver, Resolution, ResolveFailure, Track, signature_tag};
pub use collector::{Collector, DeletionOutcome, DeletionStatus, SweepPlan, SweepReport};
pub use sweep::SweepOutcome;
