//! Workload execution and per-run measurements.

use crate::config::DEFAULT_RUN_TIMEOUT;
use crate::exec::BoundedCommand;
use crate::metrics::{extract, Metrics};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of running one artifact once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    /// Display name of the profile that produced the artifact.
    pub profile_label: String,

    /// Lowest balance score in percent. Only meaningful when `success`.
    pub min_balance_score: f64,

    /// Whether the workload reported a hotspot.
    pub hotspot_detected: bool,

    /// Total suspicious patterns reported.
    pub suspicious_patterns: u64,

    /// Total blocked redirects reported.
    pub blocked_redirects: u64,

    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,

    /// stdout followed by stderr.
    #[serde(skip)]
    pub raw_output: String,

    /// Whether the run (or build) completed.
    pub success: bool,

    /// Present iff `success` is false.
    pub error: Option<String>,
}

impl Measurement {
    /// A successful run with extracted metrics.
    pub fn observed(
        profile_label: impl Into<String>,
        metrics: Metrics,
        elapsed_ms: u64,
        raw_output: String,
    ) -> Self {
        Self {
            profile_label: profile_label.into(),
            min_balance_score: metrics.min_balance_score,
            hotspot_detected: metrics.hotspot_detected,
            suspicious_patterns: metrics.suspicious_patterns,
            blocked_redirects: metrics.blocked_redirects,
            elapsed_ms,
            raw_output,
            success: true,
            error: None,
        }
    }

    /// A failed build or run. The score is zeroed and not an observation.
    pub fn failed(
        profile_label: impl Into<String>,
        error: impl Into<String>,
        elapsed_ms: u64,
        raw_output: String,
    ) -> Self {
        Self {
            profile_label: profile_label.into(),
            min_balance_score: 0.0,
            hotspot_detected: false,
            suspicious_patterns: 0,
            blocked_redirects: 0,
            elapsed_ms,
            raw_output,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Carry the counters observed before a run was cut short.
    ///
    /// The balance score stays zero: a failed run has no observed score.
    pub fn with_partial_metrics(mut self, metrics: Metrics) -> Self {
        self.hotspot_detected = metrics.hotspot_detected;
        self.suspicious_patterns = metrics.suspicious_patterns;
        self.blocked_redirects = metrics.blocked_redirects;
        self
    }

    /// Extracted metrics, as carried by this measurement.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            min_balance_score: self.min_balance_score,
            hotspot_detected: self.hotspot_detected,
            suspicious_patterns: self.suspicious_patterns,
            blocked_redirects: self.blocked_redirects,
        }
    }
}

/// Executes compiled artifacts under a wall-clock budget.
pub struct Runner;

impl Runner {
    /// Run with the runner's own 60 second budget.
    pub async fn execute_default(profile_label: &str, artifact: &Path) -> Measurement {
        Self::execute(profile_label, artifact, DEFAULT_RUN_TIMEOUT).await
    }

    /// Run `artifact` from its own directory and measure it.
    ///
    /// The workload's exit status is not inspected: its output is the result.
    /// On timeout the run is a failure, but the output captured before the
    /// kill is still parsed for its counters.
    pub async fn execute(profile_label: &str, artifact: &Path, timeout: Duration) -> Measurement {
        // Absolute, so the program still resolves after the directory change.
        let artifact = std::fs::canonicalize(artifact).unwrap_or_else(|_| artifact.to_path_buf());
        let mut command = BoundedCommand::new(artifact.display().to_string(), timeout);
        if let Some(dir) = artifact.parent().filter(|d| !d.as_os_str().is_empty()) {
            command = command.current_dir(dir);
        }

        let output = match command.run().await {
            Ok(output) => output,
            Err(e) => {
                warn!(profile = %profile_label, error = %e, "run failed to launch");
                return Measurement::failed(profile_label, e.to_string(), 0, String::new());
            }
        };

        let raw_output = output.merged();
        if output.timed_out {
            warn!(profile = %profile_label, budget_secs = timeout.as_secs(), "run timed out");
            let partial = extract(&raw_output);
            return Measurement::failed(
                profile_label,
                format!("Benchmark timeout after {}s", timeout.as_secs()),
                timeout.as_millis() as u64,
                raw_output,
            )
            .with_partial_metrics(partial);
        }

        let metrics = extract(&raw_output);
        debug!(
            profile = %profile_label,
            elapsed_ms = output.elapsed_ms,
            exit_code = ?output.exit_code,
            balance = metrics.min_balance_score,
            "run finished"
        );
        Measurement::observed(profile_label, metrics, output.elapsed_ms, raw_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_measurement_shape() {
        let m = Measurement::failed("GCC -O3", "boom", 12, String::new());
        assert!(!m.success);
        assert_eq!(m.min_balance_score, 0.0);
        assert_eq!(m.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_partial_metrics_keep_score_zero() {
        let partial = extract("Balance: 80.0%\nHotspot: YES\nSuspicious: 2\nBlocked: 4");
        let m = Measurement::failed("GCC -O3", "timeout", 5, String::new()).with_partial_metrics(partial);
        assert!(!m.success);
        assert_eq!(m.min_balance_score, 0.0);
        assert!(m.hotspot_detected);
        assert_eq!(m.suspicious_patterns, 2);
        assert_eq!(m.blocked_redirects, 4);
    }

    #[test]
    fn test_observed_measurement_shape() {
        let metrics = extract("Balance: 55.5%\nHotspot: YES\nSuspicious: 3\nBlocked: 9");
        let m = Measurement::observed("Clang -O3", metrics, 40, "raw".to_string());
        assert!(m.success);
        assert!(m.error.is_none());
        assert_eq!(m.metrics(), metrics);
        assert_eq!(m.elapsed_ms, 40);
    }

    #[test]
    fn test_raw_output_not_serialized() {
        let m = Measurement::observed("x", Metrics::default(), 1, "secret raw".to_string());
        let json = serde_json::to_string(&m).unwrap();
        assert!(!json.contains("secret raw"));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let m = Runner::execute("ghost", &dir.path().join("nope"), Duration::from_secs(5)).await;
        assert!(!m.success);
        assert!(m.error.is_some());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_runs_in_artifact_directory() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("seed.txt"), "Balance: 66.0%\n").unwrap();
            let artifact = script(dir.path(), "bench", "cat seed.txt; echo 'Blocked: 5' 1>&2");

            let m = Runner::execute("local", &artifact, Duration::from_secs(10)).await;
            assert!(m.success, "run failed: {:?}", m.error);
            assert_eq!(m.min_balance_score, 66.0);
            assert_eq!(m.blocked_redirects, 5);
            assert!(m.raw_output.contains("Blocked: 5"));
        }

        #[tokio::test]
        async fn test_nonzero_exit_still_parsed() {
            let dir = tempfile::tempdir().unwrap();
            let artifact = script(dir.path(), "bench", "echo 'Balance: 10.0%'; exit 2");
            let m = Runner::execute("local", &artifact, Duration::from_secs(10)).await;
            assert!(m.success);
            assert_eq!(m.min_balance_score, 10.0);
        }

        #[tokio::test]
        async fn test_timeout_caps_elapsed() {
            let dir = tempfile::tempdir().unwrap();
            let artifact = script(
                dir.path(),
                "bench",
                "echo 'Balance: 70.0%'; echo 'Hotspot: YES'; echo 'Suspicious: 9'; echo 'Blocked: 3'; exec sleep 30",
            );
            let m = Runner::execute("local", &artifact, Duration::from_secs(1)).await;
            assert!(!m.success);
            assert_eq!(m.elapsed_ms, 1000);
            assert!(m.error.unwrap().contains("timeout"));
            assert!(m.raw_output.contains("Balance: 70.0%"));
            assert_eq!(m.min_balance_score, 0.0);
            assert!(m.hotspot_detected);
            assert_eq!(m.suspicious_patterns, 9);
            assert_eq!(m.blocked_redirects, 3);
        }

        #[tokio::test]
        async fn test_permission_denied_is_execution_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("bench");
            std::fs::write(&path, "#!/bin/sh\necho hi\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
            let m = Runner::execute("local", &path, Duration::from_secs(5)).await;
            assert!(!m.success);
            assert!(m.error.unwrap().contains("failed to launch"));
        }
    }
}
