//! Battle orchestration: resolve profiles, build, run, collect.

use crate::aggregate::{AggregateResult, Aggregator, RunProgress};
use crate::builder::{Builder, CompileOutcome};
use crate::config::BattleConfig;
use crate::error::{BattleError, BattleResult};
use crate::probe::ToolchainProbe;
use crate::profile::{CompilerProfile, ProfileRegistry};
use crate::runner::Measurement;
use crate::verdict::Verdict;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// Progress hooks, called in processing order.
///
/// The library only logs; callers implement this to print progress.
pub trait BattleObserver {
    fn profiles_resolved(&mut self, _profiles: &[&CompilerProfile], _config: &BattleConfig) {}

    fn compile_started(&mut self, _profile: &CompilerProfile) {}

    fn compile_finished(&mut self, _profile: &CompilerProfile, _outcome: &CompileOutcome) {}

    fn run_started(&mut self, _profile: &CompilerProfile, _run: u32, _runs: u32) {}

    fn run_finished(&mut self, _profile: &CompilerProfile, _run: u32, _runs: u32, _measurement: &Measurement) {}

    fn profile_finished(&mut self, _result: &AggregateResult) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl BattleObserver for NoopObserver {}

/// Everything a finished battle produced.
#[derive(Debug, Clone)]
pub struct BattleReport {
    /// One result per profile, in processing order.
    pub results: Vec<AggregateResult>,

    /// Where the artifacts were written.
    pub build_dir: PathBuf,

    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BattleReport {
    /// Whether any profile's representative verdict is `FAIL`.
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.verdict() == Verdict::Fail)
    }

    /// Process exit status: 1 iff any profile failed.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.results.iter().filter(|r| r.verdict() == verdict).count()
    }
}

/// A configured battle over one registry.
pub struct Battle<'a> {
    registry: &'a ProfileRegistry,
    config: BattleConfig,
}

impl<'a> Battle<'a> {
    pub fn new(registry: &'a ProfileRegistry, config: BattleConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Fail fast if the workload source or include directory is missing.
    pub fn check_preconditions(&self) -> BattleResult<()> {
        if !self.config.source.is_file() {
            return Err(BattleError::MissingSource(self.config.source.clone()));
        }
        if !self.config.include_dir.is_dir() {
            return Err(BattleError::MissingIncludeDir(self.config.include_dir.clone()));
        }
        Ok(())
    }

    /// Profiles to battle, in order.
    ///
    /// An explicit list is validated key by key; any unknown key aborts.
    /// Otherwise the host is probed and the default priority subset used.
    pub fn resolve_profiles(&self) -> BattleResult<Vec<&'a CompilerProfile>> {
        let registry = self.registry;
        let keys = match &self.config.compilers {
            Some(keys) => keys.clone(),
            None => {
                let available = ToolchainProbe::detect_available(registry);
                info!(available = ?available, "detected toolchains");
                ToolchainProbe::default_selection(&available)
            }
        };

        let profiles = keys
            .iter()
            .map(|key| registry.get(key))
            .collect::<BattleResult<Vec<_>>>()?;

        if profiles.is_empty() {
            return Err(BattleError::NoProfilesAvailable);
        }
        Ok(profiles)
    }

    /// Run the whole battle.
    ///
    /// Fatal errors (bad configuration, missing workload, nothing to battle)
    /// are returned before any toolchain is invoked. Per-profile build or run
    /// failures become `ERROR` results and processing continues.
    pub async fn run(&self, observer: &mut dyn BattleObserver) -> BattleResult<BattleReport> {
        let start = Instant::now();

        if self.config.runs == 0 {
            return Err(BattleError::InvalidRuns);
        }
        self.check_preconditions()?;
        let profiles = self.resolve_profiles()?;
        observer.profiles_resolved(&profiles, &self.config);

        std::fs::create_dir_all(&self.config.build_dir)?;

        info!(
            profiles = profiles.len(),
            runs = self.config.runs,
            timeout_secs = self.config.run_timeout_secs,
            "starting battle"
        );

        let mut results = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let span = info_span!("battle.profile", profile = %profile.key);
            let result = self.battle_profile(profile, observer).instrument(span).await;
            observer.profile_finished(&result);
            results.push(result);
        }

        let report = BattleReport {
            results,
            build_dir: self.config.build_dir.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            duration_ms = report.duration_ms,
            failures = report.count(Verdict::Fail),
            errors = report.count(Verdict::Error),
            "battle finished"
        );
        Ok(report)
    }

    /// Build one profile, then run it unless the build failed.
    async fn battle_profile(
        &self,
        profile: &CompilerProfile,
        observer: &mut dyn BattleObserver,
    ) -> AggregateResult {
        let artifact = self.config.artifact_path(&profile.artifact_stem());

        observer.compile_started(profile);
        let outcome = Builder::compile(
            profile,
            &self.config.source,
            &self.config.include_dir,
            &artifact,
        )
        .await;
        observer.compile_finished(profile, &outcome);

        if let Some(message) = outcome.error_message() {
            warn!(error = %message, "build failed, skipping runs");
            return AggregateResult::build_failure(profile.clone(), message);
        }

        let runs = self.config.runs;
        let result = Aggregator::run_profile(
            profile,
            &artifact,
            runs,
            self.config.run_timeout(),
            &mut |progress| match progress {
                RunProgress::Started { run, runs } => observer.run_started(profile, run, runs),
                RunProgress::Finished {
                    run,
                    runs,
                    measurement,
                } => observer.run_finished(profile, run, runs, measurement),
            },
        )
        .await;

        info!(
            verdict = %result.verdict(),
            balance = result.measurement.min_balance_score,
            "profile judged"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scored(score: f64, success: bool) -> AggregateResult {
        let profile = CompilerProfile::new("p", "P", "cc", &[], "");
        let mut result = AggregateResult::build_failure(profile, "x".to_string());
        if success {
            result.measurement = Measurement::observed("P", Default::default(), 1, String::new());
            result.measurement.min_balance_score = score;
        }
        result
    }

    fn report(results: Vec<AggregateResult>) -> BattleReport {
        BattleReport {
            results,
            build_dir: PathBuf::from("build_battle"),
            duration_ms: 0,
        }
    }

    #[test]
    fn test_exit_code_only_on_fail() {
        assert_eq!(report(vec![]).exit_code(), 0);
        assert_eq!(report(vec![scored(60.0, true), scored(30.0, true)]).exit_code(), 0);
        assert_eq!(report(vec![scored(0.0, false)]).exit_code(), 0);
        assert_eq!(report(vec![scored(60.0, true), scored(5.0, true)]).exit_code(), 1);
    }

    #[test]
    fn test_explicit_list_keeps_caller_order() {
        let registry = ProfileRegistry::builtin();
        let config = BattleConfig::from_root(Path::new(".")).with_compiler_list("clang,gcc-O2");
        let battle = Battle::new(&registry, config);
        let keys: Vec<&str> = battle
            .resolve_profiles()
            .unwrap()
            .iter()
            .map(|p| p.key.as_str())
            .collect();
        assert_eq!(keys, vec!["clang", "gcc-O2"]);
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let registry = ProfileRegistry::builtin();
        let config = BattleConfig::from_root(Path::new(".")).with_compiler_list("gcc-O3,msvc");
        let err = Battle::new(&registry, config).resolve_profiles().unwrap_err();
        assert!(err.is_config_error());
        assert!(matches!(err, BattleError::UnknownProfile { ref key, .. } if key == "msvc"));
    }

    #[test]
    fn test_blank_entries_are_unknown_keys() {
        let registry = ProfileRegistry::builtin();
        for list in ["gcc-O3,", " , "] {
            let config = BattleConfig::from_root(Path::new(".")).with_compiler_list(list);
            let err = Battle::new(&registry, config).resolve_profiles().unwrap_err();
            assert!(
                matches!(err, BattleError::UnknownProfile { ref key, .. } if key.is_empty()),
                "list {:?} gave {:?}",
                list,
                err
            );
        }
    }

    #[test]
    fn test_auto_detect_with_nothing_installed() {
        let registry = ProfileRegistry::new(vec![CompilerProfile::new(
            "gcc-O3",
            "GCC -O3",
            "g++-that-is-not-installed-anywhere",
            &[],
            "",
        )])
        .unwrap();
        let battle = Battle::new(&registry, BattleConfig::from_root(Path::new(".")));
        assert!(matches!(
            battle.resolve_profiles(),
            Err(BattleError::NoProfilesAvailable)
        ));
    }

    #[test]
    fn test_missing_source_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ProfileRegistry::builtin();
        let battle = Battle::new(&registry, BattleConfig::from_root(dir.path()));
        assert!(matches!(
            battle.check_preconditions(),
            Err(BattleError::MissingSource(_))
        ));
    }
}
