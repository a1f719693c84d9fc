//! CLI commands

pub mod inventory;
pub mod sweep;

use std::path::PathBuf;

use clap::Args;
use clap::builder::BoolishValueParser;
use ghcr_sweep_core::{PolicyFile, RepoType, SweepConfig, parse_patterns};

use crate::error::{CliError, Result};

/// Package selection and policy flags shared by every command
///
/// Precedence, lowest first: built-in defaults, `--config` file, environment,
/// command-line flags.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Organization or user that owns the package
    #[arg(long, env = "ORG_NAME")]
    pub owner: Option<String>,

    /// Container package name
    #[arg(long, env = "PACKAGE_NAME")]
    pub package: Option<String>,

    /// GitHub token with read:packages and delete:packages
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Only report what would be deleted (default: true)
    #[arg(long, env = "DRY_RUN", value_parser = BoolishValueParser::new())]
    pub dry_run: Option<bool>,

    /// Owner type: orgs or users
    #[arg(long, env = "REPO_TYPE")]
    pub repo_type: Option<RepoType>,

    /// Keep versions updated within this many days
    #[arg(long, env = "RETENTION_DAYS")]
    pub retention_days: Option<u32>,

    /// Comma-separated tag regexes that are always kept
    #[arg(long, env = "KEEP_PATTERNS")]
    pub keep_patterns: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Container registry base URL
    #[arg(long, env = "REGISTRY_URL")]
    pub registry_url: Option<String>,

    /// YAML policy file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl TargetArgs {
    /// Build the run configuration from defaults, the policy file and overrides
    pub fn to_config(&self) -> Result<SweepConfig> {
        let mut config = SweepConfig::new("", "", "");

        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(CliError::config_with_help(
                    format!("Policy file not found: {}", path.display()),
                    "Pass an existing YAML file to --config",
                ));
            }
            let policy = PolicyFile::load_from(path)?;
            config = config.with_policy(policy);
        }

        if let Some(owner) = &self.owner {
            config.owner = owner.clone();
        }
        if let Some(package) = &self.package {
            config.package = package.clone();
        }
        if let Some(token) = &self.token {
            config.token = token.clone();
        }
        if let Some(dry_run) = self.dry_run {
            config.dry_run = dry_run;
        }
        if let Some(repo_type) = self.repo_type {
            config.repo_type = repo_type;
        }
        if let Some(days) = self.retention_days {
            config.retention_days = days;
        }
        if let Some(patterns) = &self.keep_patterns {
            config.keep_patterns = parse_patterns(patterns);
        }
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(registry_url) = &self.registry_url {
            config.registry_url = registry_url.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
