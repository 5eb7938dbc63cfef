//! Error taxonomy for classgrade.

use std::path::PathBuf;

/// Errors produced while parsing a build tool's console log.
#[derive(Debug, thiserror::Error)]
pub enum LogParseError {
    #[error("line {line}: summary has too few fields (expected at least {expected}, got {actual})")]
    TruncatedSummary {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: invalid count {token:?} in summary")]
    InvalidCount { line: usize, token: String },

    #[error("line {line}: failure counts overflow")]
    CountOverflow { line: usize },

    #[error("suite {suite}: {errors} errors exceed {total} tests")]
    InconsistentCounts {
        suite: String,
        total: u64,
        errors: u64,
    },
}

/// Classgrade domain errors.
#[derive(Debug, thiserror::Error)]
pub enum GraderError {
    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    #[error("invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("failed to read config file {path:?}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path:?}: {source}")]
    ConfigSyntax {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read credential file {path:?}: {source}")]
    Credential {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential file {0:?} is empty")]
    EmptyCredential(PathBuf),

    #[error("repository host error: {0}")]
    Host(String),

    #[error("command {command} failed to start: {reason}")]
    CommandSpawn { command: String, reason: String },

    #[error("command {command} timed out after {timeout_secs} seconds")]
    CommandTimeout { command: String, timeout_secs: u64 },

    #[error("log parse error: {0}")]
    LogParse(#[from] LogParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GraderError {
    fn from(err: reqwest::Error) -> Self {
        GraderError::Host(err.to_string())
    }
}

impl GraderError {
    /// True for errors that must stop the whole run before any phase executes.
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            GraderError::MissingConfig { .. }
                | GraderError::InvalidConfig { .. }
                | GraderError::ConfigFile { .. }
                | GraderError::ConfigSyntax { .. }
                | GraderError::Credential { .. }
                | GraderError::EmptyCredential(_)
        )
    }
}

/// Result type for classgrade domain operations.
pub type Result<T> = std::result::Result<T, GraderError>;
