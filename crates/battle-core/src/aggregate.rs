//! Worst-of-N aggregation across repeated runs of one artifact.

use crate::profile::CompilerProfile;
use crate::runner::{Measurement, Runner};
use crate::verdict::{classify, Verdict};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// One profile's representative outcome.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    /// The profile this result belongs to.
    pub profile: CompilerProfile,

    /// The worst measurement observed.
    pub measurement: Measurement,

    /// Runs executed (0 when the build failed).
    pub runs_attempted: u32,

    /// Runs that failed outright.
    pub runs_failed: u32,
}

impl AggregateResult {
    /// Result for a profile whose build failed; no runs were attempted.
    pub fn build_failure(profile: CompilerProfile, message: String) -> Self {
        let measurement = Measurement::failed(profile.display_name.clone(), message, 0, String::new());
        Self {
            profile,
            measurement,
            runs_attempted: 0,
            runs_failed: 0,
        }
    }

    /// Verdict derived from the representative measurement.
    pub fn verdict(&self) -> Verdict {
        classify(&self.measurement)
    }
}

/// Score used when looking for the worst run. Failed runs sort last.
fn selection_score(measurement: &Measurement) -> f64 {
    if measurement.success {
        measurement.min_balance_score
    } else {
        f64::INFINITY
    }
}

/// Pick the measurement with the lowest balance score.
///
/// Failed runs compare as +infinity, so any successful run masks failures in
/// the same batch; only an all-failed batch yields a failure. Ties keep the
/// earliest run.
pub fn select_worst(measurements: Vec<Measurement>) -> Option<Measurement> {
    measurements.into_iter().fold(None, |worst, m| match worst {
        Some(w) if selection_score(&w) <= selection_score(&m) => Some(w),
        _ => Some(m),
    })
}

/// Progress of a single run within a batch. `run` is 1-based.
#[derive(Debug, Clone, Copy)]
pub enum RunProgress<'m> {
    Started { run: u32, runs: u32 },
    Finished { run: u32, runs: u32, measurement: &'m Measurement },
}

/// Runs a profile's artifact repeatedly and keeps the worst run.
pub struct Aggregator;

impl Aggregator {
    /// Execute `artifact` `runs` times (at least once), sequentially.
    ///
    /// `on_progress` is told when each run starts and sees each measurement
    /// as it completes.
    pub async fn run_profile(
        profile: &CompilerProfile,
        artifact: &Path,
        runs: u32,
        timeout: Duration,
        on_progress: &mut dyn FnMut(RunProgress<'_>),
    ) -> AggregateResult {
        let runs = runs.max(1);
        let mut measurements = Vec::with_capacity(runs as usize);

        for run in 1..=runs {
            info!(profile = %profile.key, run, runs, "running benchmark");
            on_progress(RunProgress::Started { run, runs });
            let measurement = Runner::execute(&profile.display_name, artifact, timeout).await;
            on_progress(RunProgress::Finished {
                run,
                runs,
                measurement: &measurement,
            });
            measurements.push(measurement);
        }

        let runs_failed = measurements.iter().filter(|m| !m.success).count() as u32;
        if runs_failed > 0 && runs_failed < runs {
            // Failures are masked by the worst successful run.
            warn!(profile = %profile.key, runs_failed, runs, "some runs failed and are not represented");
        }

        let measurement = match select_worst(measurements) {
            Some(m) => m,
            None => Measurement::failed(profile.display_name.clone(), "no runs executed", 0, String::new()),
        };

        AggregateResult {
            profile: profile.clone(),
            measurement,
            runs_attempted: runs,
            runs_failed,
        }
    }
}
