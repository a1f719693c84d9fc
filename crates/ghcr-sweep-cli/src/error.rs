//! CLI error types with exit code handling
//!
//! Library errors are folded into a small set of diagnostics, each mapped
//! to an exit code.

use ghcr_sweep_core::SweepError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(ghcr_sweep::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Package inventory could not be fetched completely
    #[error("Inventory failed: {message}")]
    #[diagnostic(
        code(ghcr_sweep::cli::inventory),
        help("Nothing was deleted. Check the token's read:packages scope and the owner/package names.")
    )]
    Inventory { message: String },

    /// Live tags failed to resolve and strict mode is on
    #[error("{failures} live tag(s) could not be resolved; refusing to delete")]
    #[diagnostic(
        code(ghcr_sweep::cli::unsafe_to_collect),
        help("Re-run once the registry is reachable, or drop --strict to accept the risk.")
    )]
    UnsafeToCollect { failures: usize },

    /// IO error (policy file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(ghcr_sweep::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(ghcr_sweep::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Inventory { .. } => exit_codes::INVENTORY_ERROR,
            CliError::UnsafeToCollect { .. } => exit_codes::UNSAFE_TO_COLLECT,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<SweepError> for CliError {
    fn from(err: SweepError) -> Self {
        match err {
            SweepError::InvalidConfig { .. } => CliError::config_with_help(
                err.to_string(),
                "Set --owner/ORG_NAME, --package/PACKAGE_NAME and --token/GITHUB_TOKEN",
            ),
            SweepError::InvalidPattern { .. } => CliError::config_with_help(
                err.to_string(),
                "Keep patterns are comma-separated regular expressions, e.g. '^snapshot$,^release-.*'",
            ),
            SweepError::InvalidUrl { .. } | SweepError::Serialization(_) => CliError::Config {
                message: err.to_string(),
                help: None,
            },
            SweepError::InventoryPage { .. }
            | SweepError::HttpError { .. }
            | SweepError::NetworkError { .. }
            | SweepError::Timeout => CliError::Inventory {
                message: err.to_string(),
            },
            SweepError::UnsafeToCollect { failures } => CliError::UnsafeToCollect { failures },
            SweepError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::internal(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
