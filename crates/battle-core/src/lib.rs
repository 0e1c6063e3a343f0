//! Compiler Battle - hash flooding defense under different optimizers
//!
//! Builds one adversarial workload under several compiler/flag profiles and
//! grades each profile by the worst balance score it produces:
//! - Resolves profiles from an ordered registry (or probes the host `PATH`)
//! - Compiles and runs each artifact under a wall-clock budget
//! - Extracts balance/hotspot/suspicious/blocked metrics from raw output
//! - Keeps the worst of N runs and classifies it PASS/WARN/FAIL/ERROR

pub mod aggregate;
pub mod battle;
pub mod builder;
pub mod config;
pub mod error;
pub mod exec;
pub mod metrics;
pub mod probe;
pub mod profile;
pub mod report;
pub mod runner;
pub mod telemetry;
pub mod verdict;

// Re-export key types
pub use aggregate::{AggregateResult, Aggregator, RunProgress};
pub use battle::{Battle, BattleObserver, BattleReport, NoopObserver};
pub use builder::{Builder, CompileOutcome};
pub use config::BattleConfig;
pub use error::{BattleError, BattleResult};
pub use metrics::{extract, Metrics};
pub use probe::ToolchainProbe;
pub use profile::{CompilerProfile, ProfileRegistry};
pub use report::Reporter;
pub use runner::{Measurement, Runner};
pub use telemetry::init_tracing;
pub use verdict::{classify, Verdict};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
