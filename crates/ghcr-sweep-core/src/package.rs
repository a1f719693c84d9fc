//! Package version records as returned by the GitHub Packages API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored artifact in the registry namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Registry-assigned identifier, used for deletion
    pub id: u64,

    /// Content digest (`sha256:...`)
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub metadata: Option<VersionMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    #[serde(default)]
    pub package_type: Option<String>,

    #[serde(default)]
    pub container: Option<ContainerMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PackageVersion {
    /// Create a version record (mostly useful in tests and fakes)
    pub fn new(id: u64, digest: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: digest.into(),
            description: None,
            created_at,
            updated_at: None,
            metadata: None,
        }
    }

    /// Attach tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let container = ContainerMetadata {
            tags: tags.into_iter().map(Into::into).collect(),
        };
        self.metadata
            .get_or_insert_with(VersionMetadata::default)
            .container = Some(container);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Content digest of this version
    pub fn digest(&self) -> &str {
        &self.name
    }

    /// Tags attached to this version
    pub fn tags(&self) -> &[String] {
        self.metadata
            .as_ref()
            .and_then(|m| m.container.as_ref())
            .map(|c| c.tags.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_untagged(&self) -> bool {
        self.tags().is_empty()
    }

    /// Last-modified time, falling back to creation time
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    pub fn kind(&self) -> ArtifactKind {
        ArtifactKind::of(self)
    }
}

/// How a version's dependents are located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Plain or multi-arch image; dependents are listed in the index
    Image,

    /// Helm chart; its signature lives under a tag derived from the digest
    HelmChart,
}

impl ArtifactKind {
    /// Classify a version from its description
    ///
    /// The packages API does not expose media types, so this is a substring
    /// heuristic: any description mentioning "helm" (any case) is a chart.
    pub fn of(version: &PackageVersion) -> Self {
        let is_helm = version
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains("helm"));
        if is_helm {
            ArtifactKind::HelmChart
        } else {
            ArtifactKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::HelmChart => "helm-chart",
        }
    }
}
