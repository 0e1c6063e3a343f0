//! Compiler Battle - CLI
//!
//! The `compiler-battle` command reproduces hash flooding defense breakage
//! under different compilers and optimization flags on hybrid CPUs.
//!
//! ## Usage
//!
//! - `compiler-battle`: auto-detect toolchains and battle the default set
//! - `compiler-battle --compilers gcc-O3,icpx`: battle an explicit set
//! - `compiler-battle --runs 5`: keep the worst of five runs per profile
//! - `compiler-battle --list`: show the profile catalog and exit

use anyhow::{Context, Result};
use battle_core::{
    init_tracing, AggregateResult, Battle, BattleConfig, BattleObserver, CompileOutcome,
    CompilerProfile, Measurement, ProfileRegistry, Reporter, ToolchainProbe,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "compiler-battle")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Test the hash flooding defense across compilers and flags", long_about = None)]
struct Cli {
    /// Comma-separated compiler profiles to battle (default: auto-detect)
    #[arg(short, long)]
    compilers: Option<String>,

    /// Runs per compiler; the worst one is kept
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    runs: u32,

    /// Timeout per benchmark run in seconds
    #[arg(
        short,
        long,
        default_value_t = battle_core::config::DEFAULT_CLI_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Print raw benchmark output and debug logs
    #[arg(short, long)]
    verbose: bool,

    /// List available compiler profiles and exit
    #[arg(long)]
    list: bool,

    /// Project root containing bench/, include/ and build_battle/
    #[arg(long, env = "COMPILER_BATTLE_ROOT", default_value = ".")]
    project_root: PathBuf,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Print a machine-readable JSON report after the summary
    #[arg(long)]
    report_json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    init_tracing(cli.json, level);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let registry = ProfileRegistry::builtin();

    if cli.list {
        print!("{}", render_catalog(&registry));
        return Ok(ExitCode::SUCCESS);
    }

    print_banner();

    let mut config = BattleConfig::from_root(&cli.project_root)
        .with_runs(cli.runs)
        .with_run_timeout_secs(cli.timeout);
    if let Some(list) = &cli.compilers {
        config = config.with_compiler_list(list);
    }

    let battle = Battle::new(&registry, config);
    let mut console = ConsoleObserver {
        verbose: cli.verbose,
    };
    let report = battle
        .run(&mut console)
        .await
        .context("battle aborted")?;

    print!("{}", Reporter::render_table(&report.results));
    print!("{}", Reporter::render_summary(&report.results));

    if cli.report_json {
        let json = Reporter::render_json(&report.results).context("failed to render JSON report")?;
        println!("\n{}", json);
    }

    println!("\n💾 Binaries saved in: {}", display_dir(&report.build_dir));

    Ok(ExitCode::from(report.exit_code() as u8))
}

/// `--list` output: every profile with availability and description.
fn render_catalog(registry: &ProfileRegistry) -> String {
    let available = ToolchainProbe::detect_available(registry);
    let mut out = String::from("\nAvailable compiler configurations:\n");
    for profile in registry.iter() {
        let status = if available.contains(&profile.key) {
            "✅"
        } else {
            "❌ (not found)"
        };
        out.push_str(&format!("  {:<20} {}\n", profile.key, status));
        out.push_str(&format!("      {}\n", profile.description));
    }
    out
}

fn print_banner() {
    println!(
        r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                                                                              ║
║   ⚔️  COMPILER BATTLE: FINAL JUDGEMENT  ⚔️                                    ║
║                                                                              ║
║   Testing Hash Flooding Defense Under Different Compiler Optimizations       ║
║   Target: Hybrid CPU (Intel Core Ultra) LICM Optimization Bug                ║
║                                                                              ║
╚══════════════════════════════════════════════════════════════════════════════╝
"#
    );
}

fn display_dir(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Prints per-profile progress to stdout.
struct ConsoleObserver {
    verbose: bool,
}

impl BattleObserver for ConsoleObserver {
    fn profiles_resolved(&mut self, profiles: &[&CompilerProfile], config: &BattleConfig) {
        let keys: Vec<&str> = profiles.iter().map(|p| p.key.as_str()).collect();
        println!("📋 Compilers to test: {}", keys.join(", "));
        println!("📋 Runs per compiler: {}", config.runs);
        println!("📋 Timeout: {}s\n", config.run_timeout_secs);
    }

    fn compile_started(&mut self, profile: &CompilerProfile) {
        println!("\n{}", "─".repeat(60));
        println!("🔨 Compiling with {}...", profile.display_name);
        println!("   {}", profile.description);
        println!("   Flags: {}", profile.flags.join(" "));
    }

    fn compile_finished(&mut self, _profile: &CompilerProfile, outcome: &CompileOutcome) {
        match outcome.error_message() {
            Some(message) => println!("   ❌ Compilation failed: {}", message),
            None => println!("   ✅ Compilation succeeded"),
        }
    }

    fn run_started(&mut self, _profile: &CompilerProfile, run: u32, runs: u32) {
        if runs > 1 {
            println!("   🏃 Running run {}/{}...", run, runs);
        } else {
            println!("   🏃 Running benchmark...");
        }
    }

    fn run_finished(&mut self, _profile: &CompilerProfile, _run: u32, _runs: u32, measurement: &Measurement) {
        if self.verbose && measurement.success {
            println!("\n{} RAW OUTPUT {}", "=".repeat(40), "=".repeat(40));
            println!("{}", measurement.raw_output);
            println!("{}", "=".repeat(92));
        }
    }

    fn profile_finished(&mut self, result: &AggregateResult) {
        if result.runs_attempted == 0 {
            return;
        }
        let verdict = result.verdict();
        println!(
            "   {} Balance Score: {:.1}% -> {}",
            verdict.glyph(),
            result.measurement.min_balance_score,
            verdict
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["compiler-battle"]).unwrap();
        assert!(cli.compilers.is_none());
        assert_eq!(cli.runs, 1);
        assert_eq!(cli.timeout, 120);
        assert!(!cli.verbose);
        assert!(!cli.list);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "compiler-battle",
            "-c",
            "gcc-O3,icpx",
            "-r",
            "5",
            "-t",
            "30",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.compilers.as_deref(), Some("gcc-O3,icpx"));
        assert_eq!(cli.runs, 5);
        assert_eq!(cli.timeout, 30);
        assert!(cli.verbose);
    }

    #[test]
    fn test_zero_runs_rejected() {
        assert!(Cli::try_parse_from(["compiler-battle", "--runs", "0"]).is_err());
    }

    #[test]
    fn test_catalog_lists_every_profile() {
        let registry = ProfileRegistry::builtin();
        let catalog = render_catalog(&registry);
        for key in registry.keys() {
            assert!(catalog.contains(key), "missing {}", key);
        }
        assert!(catalog.contains("Loop Invariant Code Motion"));
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "compiler-battle",
            "--compilers",
            "gcc-O3",
            "--project-root",
            root.path().to_str().unwrap(),
        ])
        .unwrap();
        let err = run(cli).await.unwrap_err();
        assert!(format!("{:#}", err).contains("workload source not found"));
        assert!(!root.path().join("build_battle").exists());
    }

    #[tokio::test]
    async fn test_unknown_compiler_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("bench")).unwrap();
        std::fs::create_dir_all(root.path().join("include")).unwrap();
        std::fs::write(root.path().join("bench/adversarial_bench.cpp"), "int main() {}").unwrap();
        let cli = Cli::try_parse_from([
            "compiler-battle",
            "-c",
            "gcc-O3,turbo-cc",
            "--project-root",
            root.path().to_str().unwrap(),
        ])
        .unwrap();
        let err = run(cli).await.unwrap_err();
        let battle_err = err.downcast_ref::<battle_core::BattleError>().expect("battle error");
        assert!(battle_err.is_config_error());
        assert!(!root.path().join("build_battle").exists());
    }
}
