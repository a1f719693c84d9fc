//! Liveness classification of tagged versions
//!
//! A version is live when it was touched inside the retention window or when
//! one of its tags matches a keep pattern. Every tag of a live version is
//! then queued for resolution, in the image track or the Helm track
//! depending on the version's kind.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::{KeepPatterns, SweepConfig};
use crate::error::Result;
use crate::package::{ArtifactKind, PackageVersion};

/// Which keep rule made a version live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveReason {
    Recent,
    Pattern,
}

/// Keep rules evaluated against each version
#[derive(Debug, Clone)]
pub struct LivenessPolicy {
    pub window: Duration,
    pub patterns: KeepPatterns,
}

impl LivenessPolicy {
    pub fn new(retention_days: u32, patterns: KeepPatterns) -> Self {
        Self {
            window: Duration::days(i64::from(retention_days)),
            patterns,
        }
    }

    /// Build from configuration, compiling the keep patterns
    pub fn from_config(config: &SweepConfig) -> Result<Self> {
        Ok(Self::new(config.retention_days, config.compile_patterns()?))
    }

    /// Why `version` is live at `now`, if it is
    ///
    /// Untagged versions are never live: they have no tag to resolve.
    pub fn live_reason(
        &self,
        version: &PackageVersion,
        now: DateTime<Utc>,
    ) -> Option<LiveReason> {
        if version.is_untagged() {
            return None;
        }
        // A window reaching past the earliest representable date covers everything
        let recent = match now.checked_sub_signed(self.window) {
            Some(cutoff) => version.timestamp() >= cutoff,
            None => true,
        };
        if recent {
            return Some(LiveReason::Recent);
        }
        if version.tags().iter().any(|t| self.patterns.matches(t)) {
            return Some(LiveReason::Pattern);
        }
        None
    }

    pub fn is_live(&self, version: &PackageVersion, now: DateTime<Utc>) -> bool {
        self.live_reason(version, now).is_some()
    }
}

/// Live tags, split by resolution procedure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveTags {
    /// Resolved through the manifest and its index entries
    pub images: BTreeSet<String>,

    /// Resolved through the chart digest and its signature tag
    pub helm: BTreeSet<String>,
}

impl LiveTags {
    /// Queue a tag on the track for `kind`
    ///
    /// A tag already queued on the other track is left there.
    pub fn insert(&mut self, kind: ArtifactKind, tag: impl Into<String>) {
        let tag = tag.into();
        match kind {
            ArtifactKind::Image if !self.helm.contains(&tag) => {
                self.images.insert(tag);
            }
            ArtifactKind::HelmChart if !self.images.contains(&tag) => {
                self.helm.insert(tag);
            }
            _ => {}
        }
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.helm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.helm.is_empty()
    }
}

/// Collect the tags of every live version
pub fn classify(
    versions: &[PackageVersion],
    policy: &LivenessPolicy,
    now: DateTime<Utc>,
) -> LiveTags {
    let mut live = LiveTags::default();

    for version in versions {
        let Some(reason) = policy.live_reason(version, now) else {
            continue;
        };
        let kind = version.kind();
        tracing::debug!(
            "Live {} {} ({:?}): {}",
            kind.as_str(),
            version.digest(),
            reason,
            version.tags().join(", ")
        );
        for tag in version.tags() {
            live.insert(kind, tag.as_str());
        }
    }

    tracing::info!(
        "{} live image tag(s), {} live Helm tag(s)",
        live.images.len(),
        live.helm.len()
    );
    live
}
