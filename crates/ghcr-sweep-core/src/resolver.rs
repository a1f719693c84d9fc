//! Reachability tracing from live tags to retained digests
//!
//! Image tags keep the digest they point to plus every entry of the index
//! behind it. Helm tags keep the chart digest, then follow the signature
//! stored under the tag derived from that digest (`sha256:abc` becomes
//! `sha256-abc`) and keep the signature manifest and its entries.
//!
//! A failed fetch never aborts tracing. Failures are logged and returned to
//! the caller, because a tag that did not resolve leaves its digests
//! unprotected.

use serde::Serialize;

use crate::error::SweepError;
use crate::liveness::LiveTags;
use crate::registry::{Manifest, ManifestSource};
use crate::retention::RetentionSet;

/// Resolution track a failure happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Track {
    Image,
    Helm,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Image => "image",
            Track::Helm => "helm",
        }
    }
}

/// A live tag whose manifest could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveFailure {
    pub tag: String,
    pub track: Track,
    /// `None` for a missing manifest
    pub status: Option<u16>,
    pub message: String,
}

/// Outcome of tracing every live tag
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub retained: RetentionSet,
    pub failures: Vec<ResolveFailure>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Tag under which the signature of `digest` is stored
pub fn signature_tag(digest: &str) -> String {
    digest.replace(':', "-")
}

/// Expands live tags into retained digests
pub struct ManifestResolver<'a, S: ManifestSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: ManifestSource + ?Sized> ManifestResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Trace both tracks
    pub async fn resolve(&self, live: &LiveTags) -> Resolution {
        let mut resolution = Resolution::default();

        for tag in &live.images {
            self.resolve_image(tag, &mut resolution).await;
        }
        for tag in &live.helm {
            self.resolve_helm(tag, &mut resolution).await;
        }

        tracing::info!(
            "Resolved {} live tag(s) to {} retained digest(s), {} failure(s)",
            live.len(),
            resolution.retained.len(),
            resolution.failures.len()
        );
        resolution
    }

    /// Keep the tag's manifest and every index entry
    pub async fn resolve_image(&self, tag: &str, resolution: &mut Resolution) {
        let Some(manifest) = self.fetch(tag, Track::Image, resolution).await else {
            return;
        };
        if manifest.is_index() {
            tracing::debug!(
                "{} -> index {} ({} sub-manifest(s))",
                tag,
                manifest.digest,
                manifest.sub_manifests.len()
            );
        } else {
            tracing::debug!("{} -> {}", tag, manifest.digest);
        }
        resolution.retained.extend(manifest.digests());
    }

    /// Keep the chart digest, then its signature manifest and entries
    pub async fn resolve_helm(&self, tag: &str, resolution: &mut Resolution) {
        let Some(chart) = self.fetch(tag, Track::Helm, resolution).await else {
            return;
        };
        resolution.retained.insert(chart.digest.as_str());

        let sig_tag = signature_tag(&chart.digest);
        match self.source.fetch_manifest(&sig_tag).await {
            Ok(Some(signature)) => {
                tracing::debug!("{} -> {} signed by {}", tag, chart.digest, signature.digest);
                resolution.retained.extend(signature.digests());
            }
            Ok(None) => {
                tracing::debug!("No signature for chart {} ({})", tag, sig_tag);
            }
            Err(e) => {
                tracing::debug!("Signature lookup for chart {} failed: {}", tag, e);
            }
        }
    }

    async fn fetch(
        &self,
        tag: &str,
        track: Track,
        resolution: &mut Resolution,
    ) -> Option<Manifest> {
        match self.source.fetch_manifest(tag).await {
            Ok(Some(manifest)) => Some(manifest),
            Ok(None) => {
                tracing::warn!("Manifest for tag {} not found, skipping", tag);
                resolution.failures.push(ResolveFailure {
                    tag: tag.to_string(),
                    track,
                    status: None,
                    message: "manifest not found".to_string(),
                });
                None
            }
            Err(e) => {
                tracing::error!("Failed to fetch manifest for tag {}: {}", tag, e);
                let status = match &e {
                    SweepError::ManifestFetch { status, .. }
                    | SweepError::HttpError { status, .. } => Some(*status),
                    _ => None,
                };
                resolution.failures.push(ResolveFailure {
                    tag: tag.to_string(),
                    track,
                    status,
                    message: e.to_string(),
                });
                None
            }
        }
    }
}
