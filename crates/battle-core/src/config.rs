//! Battle configuration and the fixed project layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Compile budget. Fixed, not user-configurable.
pub const COMPILE_TIMEOUT: Duration = Duration::from_secs(120);

/// Runner budget when no caller budget is supplied.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(60);

/// Run budget surfaced on the command line.
pub const DEFAULT_CLI_TIMEOUT_SECS: u64 = 120;

/// Workload source, relative to the project root.
pub const SOURCE_RELATIVE: &str = "bench/adversarial_bench.cpp";

/// Include directory, relative to the project root.
pub const INCLUDE_RELATIVE: &str = "include";

/// Build output directory, relative to the project root.
pub const BUILD_RELATIVE: &str = "build_battle";

/// Everything the orchestrator needs to run a battle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BattleConfig {
    /// Workload source file.
    pub source: PathBuf,

    /// Include directory passed as `-I`.
    pub include_dir: PathBuf,

    /// Directory artifacts are written to; created if absent.
    pub build_dir: PathBuf,

    /// Explicit profile keys. `None` means auto-detect.
    pub compilers: Option<Vec<String>>,

    /// Runs per profile; the worst one is kept.
    pub runs: u32,

    /// Wall-clock budget per run, in seconds.
    pub run_timeout_secs: u64,
}

impl BattleConfig {
    /// Derive the fixed layout under `root`.
    pub fn from_root(root: &Path) -> Self {
        Self {
            source: root.join(SOURCE_RELATIVE),
            include_dir: root.join(INCLUDE_RELATIVE),
            build_dir: root.join(BUILD_RELATIVE),
            compilers: None,
            runs: 1,
            run_timeout_secs: DEFAULT_CLI_TIMEOUT_SECS,
        }
    }

    /// Select profiles from a comma-separated list.
    ///
    /// Entries are trimmed but never dropped, so a blank entry reaches the
    /// registry as the key `""` and fails validation.
    pub fn with_compiler_list(mut self, list: &str) -> Self {
        let keys = list.split(',').map(|k| k.trim().to_string()).collect();
        self.compilers = Some(keys);
        self
    }

    pub fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_run_timeout_secs(mut self, secs: u64) -> Self {
        self.run_timeout_secs = secs;
        self
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Profile-unique artifact path inside the build directory.
    pub fn artifact_path(&self, stem: &str) -> PathBuf {
        let path = self.build_dir.join(stem);
        if cfg!(windows) {
            path.with_extension("exe")
        } else {
            path
        }
    }
}
