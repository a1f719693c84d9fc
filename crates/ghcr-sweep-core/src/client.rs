//! Shared HTTP client construction

use crate::error::{Result, SweepError};

/// User agent sent to both GitHub endpoints
pub const USER_AGENT: &str = concat!("ghcr-sweep/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for API and registry calls
///
/// No timeout or retry policy is layered on top of reqwest's defaults; a run
/// is a one-shot batch job.
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SweepError::NetworkError {
            message: e.to_string(),
        })
}

/// Append path segments to a base URL, percent-encoding each one
///
/// A package name such as `charts/operator` is a single segment here and
/// ends up as `charts%2Foperator`.
pub fn join_segments(base: &str, segments: &[&str]) -> Result<url::Url> {
    let mut url = url::Url::parse(base).map_err(|e| SweepError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|_| SweepError::InvalidUrl {
            url: base.to_string(),
            reason: "URL cannot be a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
