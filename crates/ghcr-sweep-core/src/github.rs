//! GitHub Packages API client
//!
//! Enumerates every version of a container package and deletes versions by
//! id. Listing is all-or-nothing: a failed page aborts the whole inventory,
//! since collecting against a partial view could delete live images.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};

use crate::client::{build_http_client, join_segments};
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::package::PackageVersion;

/// Page size requested from the listing endpoint (the API maximum)
pub const PAGE_SIZE: u32 = 100;

const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Package-version listing and deletion
#[async_trait]
pub trait PackageApi: Send + Sync {
    /// Fetch every version of the package, across all pages
    async fn list_versions(&self) -> Result<Vec<PackageVersion>>;

    /// Delete one version by id
    async fn delete_version(&self, id: u64) -> Result<()>;
}

/// `reqwest`-backed GitHub Packages client
pub struct GitHubPackages {
    client: reqwest::Client,
    versions_url: url::Url,
    token: String,
}

impl GitHubPackages {
    /// Create a client for the package named in `config`
    pub fn new(config: &SweepConfig) -> Result<Self> {
        let versions_url = join_segments(
            &config.api_url,
            &[
                config.repo_type.as_str(),
                &config.owner,
                "packages",
                "container",
                &config.package,
                "versions",
            ],
        )?;

        Ok(Self {
            client: build_http_client()?,
            versions_url,
            token: config.token.clone(),
        })
    }

    /// Listing endpoint for the package
    pub fn versions_url(&self) -> &url::Url {
        &self.versions_url
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, GITHUB_JSON)
            .header(API_VERSION_HEADER, API_VERSION)
    }
}

#[async_trait]
impl PackageApi for GitHubPackages {
    async fn list_versions(&self) -> Result<Vec<PackageVersion>> {
        let mut url = self.versions_url.clone();
        url.query_pairs_mut()
            .append_pair("per_page", &PAGE_SIZE.to_string());

        let mut next = Some(url.to_string());
        let mut versions = Vec::new();
        let mut page = 0;

        while let Some(current) = next.take() {
            page += 1;
            tracing::debug!("Fetching package versions page {}: {}", page, current);

            let response = self.request(reqwest::Method::GET, &current).send().await?;
            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(SweepError::InventoryPage {
                    page,
                    status: status.as_u16(),
                    message,
                });
            }

            next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);

            let batch: Vec<PackageVersion> = response.json().await?;
            tracing::debug!("Page {} returned {} version(s)", page, batch.len());
            versions.extend(batch);
        }

        tracing::info!(
            "Inventoried {} package version(s) over {} page(s)",
            versions.len(),
            page
        );
        Ok(versions)
    }

    async fn delete_version(&self, id: u64) -> Result<()> {
        let url = join_segments(self.versions_url.as_str(), &[&id.to_string()])?;
        let response = self
            .request(reqwest::Method::DELETE, url.as_str())
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("Version {} already gone", id);
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(SweepError::DeleteFailed {
            id,
            status: status.as_u16(),
            message,
        })
    }
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });

        is_next.then(|| target.to_string())
    })
}
