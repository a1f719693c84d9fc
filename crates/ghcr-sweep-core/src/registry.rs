//! OCI registry manifest client
//!
//! Only manifest GETs are needed: the digest a reference points to comes
//! from the `Docker-Content-Digest` response header, and an index body
//! lists the platform manifests it depends on.

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::client::{build_http_client, join_segments};
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};

/// Manifest media types
pub mod media_types {
    /// OCI image index (multi-arch)
    pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
    /// OCI image manifest
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
    /// Docker manifest list (multi-arch)
    pub const DOCKER_MANIFEST_LIST: &str =
        "application/vnd.docker.distribution.manifest.list.v2+json";
    /// Docker image manifest v2
    pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";
}

/// Accept header sent on every manifest fetch
///
/// Index types come first so a multi-arch tag is served as its index rather
/// than a single platform manifest.
pub const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json";

/// Header carrying the manifest's content digest
pub const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

/// Platform of an index entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{}", variant)?;
        }
        Ok(())
    }
}

/// Entry of an index's `manifests` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub digest: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub platform: Option<Platform>,
}

impl Descriptor {
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            media_type: None,
            platform: None,
        }
    }
}

/// The subset of a manifest body needed for reachability
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestBody {
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    manifests: Vec<Descriptor>,
}

/// A fetched manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Digest reported by the registry, not computed from the body
    pub digest: String,

    pub media_type: Option<String>,

    /// Platform manifests of an index; empty for a leaf manifest
    pub sub_manifests: Vec<Descriptor>,
}

impl Manifest {
    /// Leaf manifest with no sub-manifests
    pub fn leaf(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            media_type: Some(media_types::OCI_MANIFEST.to_string()),
            sub_manifests: Vec::new(),
        }
    }

    /// Index listing the given platform digests
    pub fn index<I, S>(digest: impl Into<String>, sub_manifests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            digest: digest.into(),
            media_type: Some(media_types::OCI_INDEX.to_string()),
            sub_manifests: sub_manifests
                .into_iter()
                .map(Descriptor::new)
                .collect(),
        }
    }

    /// Build a manifest from a response body and its digest header
    pub fn from_body(reference: &str, digest: String, body: &[u8]) -> Result<Self> {
        let parsed: ManifestBody =
            serde_json::from_slice(body).map_err(|e| SweepError::InvalidManifest {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            digest,
            media_type: parsed.media_type,
            sub_manifests: parsed.manifests,
        })
    }

    pub fn is_index(&self) -> bool {
        !self.sub_manifests.is_empty()
    }

    /// The manifest's own digest followed by every sub-manifest digest
    pub fn digests(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.digest.as_str())
            .chain(self.sub_manifests.iter().map(|d| d.digest.as_str()))
    }
}

/// Source of manifests by tag or digest
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch the manifest a reference points to; `Ok(None)` when it does not exist
    async fn fetch_manifest(&self, reference: &str) -> Result<Option<Manifest>>;
}

/// `reqwest`-backed registry client for one repository
pub struct RegistryClient {
    client: reqwest::Client,
    manifests_url: url::Url,
    bearer: String,
}

impl RegistryClient {
    /// Create a client for `{registry}/v2/{owner}/{package}`
    pub fn new(config: &SweepConfig) -> Result<Self> {
        let mut segments = vec!["v2", config.owner.as_str()];
        segments.extend(config.package.split('/').filter(|s| !s.is_empty()));
        segments.push("manifests");

        Ok(Self {
            client: build_http_client()?,
            manifests_url: join_segments(&config.registry_url, &segments)?,
            bearer: registry_bearer(&config.token),
        })
    }

    /// URL a reference's manifest is fetched from
    pub fn manifest_url(&self, reference: &str) -> Result<url::Url> {
        join_segments(self.manifests_url.as_str(), &[reference])
    }
}

#[async_trait]
impl ManifestSource for RegistryClient {
    async fn fetch_manifest(&self, reference: &str) -> Result<Option<Manifest>> {
        let url = self.manifest_url(reference)?;
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer))
            .header(ACCEPT, MANIFEST_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SweepError::ManifestFetch {
                reference: reference.to_string(),
                status: status.as_u16(),
            });
        }

        let digest = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| SweepError::MissingDigestHeader {
                reference: reference.to_string(),
            })?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?;
        let mut manifest = Manifest::from_body(reference, digest, &body)?;
        if manifest.media_type.is_none() {
            manifest.media_type = content_type;
        }
        Ok(Some(manifest))
    }
}

/// ghcr.io accepts a GitHub token as a registry bearer once base64-encoded
pub fn registry_bearer(token: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(token)
}
