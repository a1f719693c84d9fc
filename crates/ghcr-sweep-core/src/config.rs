//! Sweep configuration
//!
//! A [`SweepConfig`] is built once (from flags, environment and an optional
//! YAML policy file) and passed by reference into the pipeline. Nothing in
//! this crate reads process-wide state after that point.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, SweepError};

/// Recency window applied when none is configured
pub const DEFAULT_RETENTION_DAYS: u32 = 14;

/// Tags kept regardless of age when no patterns are configured
pub const DEFAULT_KEEP_PATTERNS: &[&str] = &["^snapshot$", "^snapshot-release-.*"];

/// GitHub REST API base
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub Container Registry base
pub const DEFAULT_REGISTRY_URL: &str = "https://ghcr.io";

/// Owner kind, selecting the API path prefix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    /// Organization-owned packages (`/orgs/{owner}/...`)
    #[default]
    Orgs,

    /// User-owned packages (`/users/{owner}/...`)
    Users,
}

impl RepoType {
    /// Path segment used in the packages API
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoType::Orgs => "orgs",
            RepoType::Users => "users",
        }
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepoType {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "orgs" | "org" => Ok(RepoType::Orgs),
            "users" | "user" => Ok(RepoType::Users),
            other => Err(SweepError::InvalidConfig {
                message: format!("repo type must be 'orgs' or 'users', got '{}'", other),
            }),
        }
    }
}

/// Optional YAML policy file
///
/// Every field is optional; values given on the command line or through the
/// environment take precedence. The token is never read from this file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyFile {
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub package: Option<String>,

    #[serde(default)]
    pub repo_type: Option<RepoType>,

    #[serde(default)]
    pub dry_run: Option<bool>,

    #[serde(default)]
    pub retention_days: Option<u32>,

    #[serde(default)]
    pub keep_patterns: Option<Vec<String>>,

    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub registry_url: Option<String>,

    #[serde(default)]
    pub abort_on_resolve_failure: Option<bool>,
}

impl PolicyFile {
    /// Load a policy file from disk
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy: Self = serde_yaml::from_str(&content)?;
        Ok(policy)
    }
}

/// Immutable configuration for one sweep run
#[derive(Clone, Serialize)]
pub struct SweepConfig {
    /// Organization or user owning the package
    pub owner: String,

    /// Container package name (may contain `/`)
    pub package: String,

    pub repo_type: RepoType,

    /// Bearer credential for both the packages API and the registry
    #[serde(skip)]
    pub token: String,

    /// When set, deletions are only logged
    pub dry_run: bool,

    /// Recency window in days (inclusive)
    pub retention_days: u32,

    /// Tag patterns that keep a version regardless of age
    pub keep_patterns: Vec<String>,

    pub api_url: String,

    pub registry_url: String,

    /// Refuse to delete anything when a live tag failed to resolve
    pub abort_on_resolve_failure: bool,
}

impl fmt::Debug for SweepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepConfig")
            .field("owner", &self.owner)
            .field("package", &self.package)
            .field("repo_type", &self.repo_type)
            .field("token", &"<redacted>")
            .field("dry_run", &self.dry_run)
            .field("retention_days", &self.retention_days)
            .field("keep_patterns", &self.keep_patterns)
            .field("api_url", &self.api_url)
            .field("registry_url", &self.registry_url)
            .field("abort_on_resolve_failure", &self.abort_on_resolve_failure)
            .finish()
    }
}

impl SweepConfig {
    /// Create a configuration with defaults for everything but identity
    pub fn new(
        owner: impl Into<String>,
        package: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            package: package.into(),
            repo_type: RepoType::default(),
            token: token.into(),
            dry_run: true,
            retention_days: DEFAULT_RETENTION_DAYS,
            keep_patterns: DEFAULT_KEEP_PATTERNS.iter().map(|p| p.to_string()).collect(),
            api_url: DEFAULT_API_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            abort_on_resolve_failure: false,
        }
    }

    /// Apply a policy file
    ///
    /// Owner and package are only filled when empty. Call this before
    /// applying explicit overrides.
    pub fn with_policy(mut self, policy: PolicyFile) -> Self {
        if self.owner.is_empty() {
            if let Some(owner) = policy.owner {
                self.owner = owner;
            }
        }
        if self.package.is_empty() {
            if let Some(package) = policy.package {
                self.package = package;
            }
        }
        if let Some(repo_type) = policy.repo_type {
            self.repo_type = repo_type;
        }
        if let Some(dry_run) = policy.dry_run {
            self.dry_run = dry_run;
        }
        if let Some(days) = policy.retention_days {
            self.retention_days = days;
        }
        if let Some(patterns) = policy.keep_patterns {
            self.keep_patterns = patterns;
        }
        if let Some(api_url) = policy.api_url {
            self.api_url = api_url;
        }
        if let Some(registry_url) = policy.registry_url {
            self.registry_url = registry_url;
        }
        if let Some(abort) = policy.abort_on_resolve_failure {
            self.abort_on_resolve_failure = abort;
        }
        self
    }

    /// Check required fields and URL shapes
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(SweepError::InvalidConfig {
                message: "owner (organization or user) is required".to_string(),
            });
        }
        if self.package.trim().is_empty() {
            return Err(SweepError::InvalidConfig {
                message: "package name is required".to_string(),
            });
        }
        if self.token.trim().is_empty() {
            return Err(SweepError::InvalidConfig {
                message: "an auth token is required".to_string(),
            });
        }
        for url in [&self.api_url, &self.registry_url] {
            url::Url::parse(url).map_err(|e| SweepError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Compile the configured keep patterns
    pub fn compile_patterns(&self) -> Result<KeepPatterns> {
        KeepPatterns::compile(&self.keep_patterns)
    }
}

/// Split a comma-separated pattern list, dropping blanks
pub fn parse_patterns(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Compiled always-keep tag patterns
#[derive(Debug, Clone, Default)]
pub struct KeepPatterns {
    patterns: Vec<Regex>,
}

impl KeepPatterns {
    /// Compile every pattern, failing on the first malformed one
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|e| SweepError::InvalidPattern {
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether any pattern matches at the start of `tag`
    ///
    /// Matching is anchored at the beginning only; a pattern has to end with
    /// `$` to require the whole tag.
    pub fn matches(&self, tag: &str) -> bool {
        self.patterns
            .iter()
            .any(|re| re.find(tag).is_some_and(|m| m.start() == 0))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_type_parse() {
        assert_eq!("orgs".parse::<RepoType>().unwrap(), RepoType::Orgs);
        assert_eq!("Users".parse::<RepoType>().unwrap(), RepoType::Users);
        assert!("teams".parse::<RepoType>().is_err());
        assert_eq!(RepoType::Users.to_string(), "users");
    }

    #[test]
    fn test_defaults() {
        let config = SweepConfig::new("acme", "operator", "t0k3n");
        assert!(config.dry_run);
        assert_eq!(config.retention_days, 14);
        assert_eq!(config.repo_type, RepoType::Orgs);
        assert_eq!(config.keep_patterns.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = SweepConfig::new("acme", "operator", "super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(SweepConfig::new("", "operator", "t").validate().is_err());
        assert!(SweepConfig::new("acme", " ", "t").validate().is_err());
        assert!(SweepConfig::new("acme", "operator", "").validate().is_err());

        let mut config = SweepConfig::new("acme", "operator", "t");
        config.api_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(SweepError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_parse_patterns() {
        assert_eq!(
            parse_patterns("^snapshot$, ^release-.* ,,"),
            vec!["^snapshot$".to_string(), "^release-.*".to_string()]
        );
        assert!(parse_patterns("").is_empty());
    }

    #[test]
    fn test_keep_patterns_prefix_semantics() {
        let patterns = KeepPatterns::compile(DEFAULT_KEEP_PATTERNS).unwrap();
        assert!(patterns.matches("snapshot"));
        assert!(patterns.matches("snapshot-release-1.2.3"));
        assert!(!patterns.matches("snapshot-1"));
        assert!(!patterns.matches("my-snapshot"));

        // Unanchored patterns still only match from the start of the tag
        let unanchored = KeepPatterns::compile(&["release"]).unwrap();
        assert!(unanchored.matches("release-1.0"));
        assert!(!unanchored.matches("pre-release"));
    }

    #[test]
    fn test_keep_patterns_invalid() {
        let err = KeepPatterns::compile(&["snapshot-(unclosed"]).unwrap_err();
        assert!(matches!(err, SweepError::InvalidPattern { .. }));
    }

    #[test]
    fn test_policy_file_merge() {
        let yaml = r#"
owner: acme
repoType: users
retentionDays: 30
keepPatterns:
  - "^stable$"
abortOnResolveFailure: true
"#;
        let policy: PolicyFile = serde_yaml::from_str(yaml).unwrap();
        let config = SweepConfig::new("", "operator", "t").with_policy(policy);

        assert_eq!(config.owner, "acme");
        assert_eq!(config.package, "operator");
        assert_eq!(config.repo_type, RepoType::Users);
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.keep_patterns, vec!["^stable$".to_string()]);
        assert!(config.abort_on_resolve_failure);
        assert!(config.dry_run);
    }

    #[test]
    fn test_policy_file_rejects_unknown_fields() {
        let yaml = "owner: acme\ntoken: leaked\n";
        assert!(serde_yaml::from_str::<PolicyFile>(yaml).is_err());
    }

    #[test]
    fn test_policy_file_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sweep.yaml");
        std::fs::write(&path, "package: charts/operator\ndryRun: false\n").unwrap();

        let policy = PolicyFile::load_from(&path).unwrap();
        assert_eq!(policy.package.as_deref(), Some("charts/operator"));
        assert_eq!(policy.dry_run, Some(false));
    }
}
