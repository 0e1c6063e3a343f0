//! Error types for the battle pipeline.
//!
//! Only fatal conditions live here. Per-profile build failures and per-run
//! execution failures are recorded as `ERROR` results instead of aborting.

use std::path::PathBuf;

/// Fatal errors that abort a battle before (or instead of) any build.
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error("unknown compiler profile '{key}' (available: {})", .available.join(", "))]
    UnknownProfile { key: String, available: Vec<String> },

    #[error("duplicate compiler profile key '{0}'")]
    DuplicateProfile(String),

    #[error("workload source not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("include directory not found: {}", .0.display())]
    MissingIncludeDir(PathBuf),

    #[error("no compatible compiler found on PATH (install g++ or adjust PATH)")]
    NoProfilesAvailable,

    #[error("run count must be at least 1")]
    InvalidRuns,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BattleError {
    /// Whether this error was caused by caller-supplied configuration
    /// rather than the state of the host.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BattleError::UnknownProfile { .. }
                | BattleError::DuplicateProfile(_)
                | BattleError::InvalidRuns
        )
    }
}

/// Result type for battle operations.
pub type BattleResult<T> = std::result::Result<T, BattleError>;
