//! Compiling the workload with one compiler profile.

use crate::config::COMPILE_TIMEOUT;
use crate::exec::{BoundedCommand, ExecError};
use crate::profile::CompilerProfile;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of compiling the workload with one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The artifact exists at the requested output path.
    Success { duration_ms: u64 },

    /// The toolchain exited non-zero; `diagnostics` is its stderr verbatim.
    Failed { exit_code: Option<i32>, diagnostics: String },

    /// The toolchain exceeded the compile budget and was killed.
    TimedOut { budget_secs: u64 },

    /// The executable could not be found when it was launched.
    ToolchainMissing { executable: String },

    /// Any other launch failure.
    LaunchFailed { message: String },
}

impl CompileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Success { .. })
    }

    /// Message recorded against the profile when the build did not succeed.
    pub fn error_message(&self) -> Option<String> {
        match self {
            CompileOutcome::Success { .. } => None,
            CompileOutcome::Failed { diagnostics, .. } => {
                Some(format!("Compilation failed:\n{}", diagnostics))
            }
            CompileOutcome::TimedOut { .. } => Some("Compilation timeout".to_string()),
            CompileOutcome::ToolchainMissing { executable } => {
                Some(format!("Compiler not found: {}", executable))
            }
            CompileOutcome::LaunchFailed { message } => Some(message.clone()),
        }
    }
}

/// Compiles the fixed workload source into a profile-specific artifact.
pub struct Builder;

impl Builder {
    /// The command line for `profile`: flags, include path, source, output.
    pub fn command(
        profile: &CompilerProfile,
        source: &Path,
        include_dir: &Path,
        output: &Path,
        timeout: Duration,
    ) -> BoundedCommand {
        BoundedCommand::new(profile.executable.clone(), timeout)
            .args(profile.flags.iter().cloned())
            .arg(format!("-I{}", include_dir.display()))
            .arg(source.display().to_string())
            .arg("-o")
            .arg(output.display().to_string())
    }

    /// Compile with the fixed 120 second budget.
    pub async fn compile(
        profile: &CompilerProfile,
        source: &Path,
        include_dir: &Path,
        output: &Path,
    ) -> CompileOutcome {
        Self::compile_with_timeout(profile, source, include_dir, output, COMPILE_TIMEOUT).await
    }

    /// Compile under an explicit budget. No retries.
    pub async fn compile_with_timeout(
        profile: &CompilerProfile,
        source: &Path,
        include_dir: &Path,
        output: &Path,
        timeout: Duration,
    ) -> CompileOutcome {
        let start = Instant::now();

        // A leftover artifact must not pass for this build's output.
        if let Err(e) = std::fs::remove_file(output) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(profile = %profile.key, error = %e, "cannot remove stale artifact");
                return CompileOutcome::LaunchFailed {
                    message: format!("cannot remove stale artifact {}: {}", output.display(), e),
                };
            }
        }

        let command = Self::command(profile, source, include_dir, output, timeout);
        info!(profile = %profile.key, flags = %profile.flags.join(" "), "compiling");

        let result = match command.run().await {
            Ok(result) => result,
            Err(ExecError::NotFound { program }) => {
                warn!(profile = %profile.key, executable = %program, "toolchain not found");
                return CompileOutcome::ToolchainMissing {
                    executable: program,
                };
            }
            Err(e) => {
                warn!(profile = %profile.key, error = %e, "toolchain launch failed");
                return CompileOutcome::LaunchFailed {
                    message: e.to_string(),
                };
            }
        };

        if result.timed_out {
            warn!(profile = %profile.key, budget_secs = timeout.as_secs(), "compile timed out");
            return CompileOutcome::TimedOut {
                budget_secs: timeout.as_secs(),
            };
        }

        if !result.success {
            warn!(profile = %profile.key, exit_code = ?result.exit_code, "compile failed");
            return CompileOutcome::Failed {
                exit_code: result.exit_code,
                diagnostics: result.stderr,
            };
        }

        if !output.exists() {
            return CompileOutcome::Failed {
                exit_code: result.exit_code,
                diagnostics: format!(
                    "toolchain reported success but produced no artifact at {}",
                    output.display()
                ),
            };
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(profile = %profile.key, duration_ms, "compile succeeded");
        CompileOutcome::Success { duration_ms }
    }
}
