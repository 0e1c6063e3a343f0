//! Battle report rendering.
//!
//! Provides three views over the collected results:
//! - `render_table`: fixed-width per-profile table
//! - `render_summary`: digest line, totals, alert and confirmation blocks
//! - `render_json`: machine-readable report for CI consumers

use crate::aggregate::AggregateResult;
use crate::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

const WIDTH: usize = 80;

const POSSIBLE_CAUSES: [&str; 3] = [
    "Loop Invariant Code Motion (LICM) hoists the load reads out of the loop",
    "Aggressive optimizations on the E-cores of hybrid CPUs",
    "Reordering of memory_order_relaxed accesses",
];

const RECOMMENDED_FIXES: [&str; 3] = [
    "Build with -fno-tree-loop-im to disable LICM",
    "Add compiler barriers in cached_load_stats.hpp",
    "Switch critical reads to memory_order_acquire",
];

const ERROR_HINTS: [&str; 2] = [
    "Check that the toolchain is installed and on PATH",
    "Read the compiler diagnostics or raise --timeout for slow hosts",
];

/// Number of results per verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerdictCounts {
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
    pub error: usize,
}

impl VerdictCounts {
    pub fn tally(results: &[AggregateResult]) -> Self {
        let mut counts = Self::default();
        for result in results {
            match result.verdict() {
                Verdict::Pass => counts.pass += 1,
                Verdict::Warn => counts.warn += 1,
                Verdict::Fail => counts.fail += 1,
                Verdict::Error => counts.error += 1,
            }
        }
        counts
    }
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    key: &'a str,
    display_name: &'a str,
    executable: &'a str,
    flags: &'a [String],
    verdict: Verdict,
    min_balance_score: Option<f64>,
    hotspot_detected: bool,
    suspicious_patterns: u64,
    blocked_redirects: u64,
    elapsed_ms: u64,
    error: Option<&'a str>,
    runs_attempted: u32,
    runs_failed: u32,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    harness_version: &'static str,
    totals: VerdictCounts,
    results: Vec<JsonEntry<'a>>,
}

/// Renders battle results for humans and machines.
pub struct Reporter;

impl Reporter {
    /// Fixed-width result table.
    pub fn render_table(results: &[AggregateResult]) -> String {
        let mut out = String::new();
        let heavy = "═".repeat(WIDTH);

        let _ = writeln!(out, "\n{}", heavy);
        let _ = writeln!(out, "  FINAL JUDGEMENT RESULTS");
        let _ = writeln!(out, "{}", heavy);
        let _ = writeln!(
            out,
            "{:<25} {:<10} {:<8} {:<10} {:<12} {:<10}",
            "Compiler", "Balance", "Status", "Hotspot", "Suspicious", "Time"
        );
        let _ = writeln!(out, "{}", "-".repeat(WIDTH));

        for result in results {
            let m = &result.measurement;
            let verdict = result.verdict();
            if m.success {
                let _ = writeln!(
                    out,
                    "{:<25} {:>6.1}%   {} {:<5} {:<10} {:<12} {}ms",
                    result.profile.display_name,
                    m.min_balance_score,
                    verdict.glyph(),
                    verdict.as_str(),
                    if m.hotspot_detected { "YES" } else { "No" },
                    m.suspicious_patterns,
                    m.elapsed_ms
                );
            } else {
                let _ = writeln!(
                    out,
                    "{:<25} {:<10} {} {:<5} {:<10} {:<12} {}",
                    result.profile.display_name,
                    "N/A",
                    verdict.glyph(),
                    verdict.as_str(),
                    "N/A",
                    "N/A",
                    m.error.as_deref().unwrap_or("Unknown error")
                );
            }
        }

        let _ = writeln!(out, "{}", heavy);
        out
    }

    /// Digest line per profile, e.g. `GCC -O3: FAIL (12%)`.
    pub fn digest_line(results: &[AggregateResult]) -> String {
        results
            .iter()
            .map(|r| match r.verdict() {
                Verdict::Error => format!("{}: ERROR", r.profile.display_name),
                v => format!(
                    "{}: {} ({:.0}%)",
                    r.profile.display_name,
                    v,
                    r.measurement.min_balance_score
                ),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Executive summary with remediation guidance for failing profiles.
    pub fn render_summary(results: &[AggregateResult]) -> String {
        let mut out = String::new();
        let counts = VerdictCounts::tally(results);

        let _ = writeln!(out, "\n╔{}╗", "═".repeat(66));
        let _ = writeln!(out, "║  {:<64}║", "EXECUTIVE SUMMARY");
        let _ = writeln!(out, "╚{}╝\n", "═".repeat(66));

        let _ = writeln!(out, "  {}", Self::digest_line(results));
        let _ = writeln!(
            out,
            "\n  Total: {} PASS, {} WARN, {} FAIL, {} ERROR",
            counts.pass, counts.warn, counts.fail, counts.error
        );

        let failed: Vec<&AggregateResult> = results
            .iter()
            .filter(|r| r.verdict() == Verdict::Fail)
            .collect();
        let errored: Vec<&AggregateResult> = results
            .iter()
            .filter(|r| r.verdict() == Verdict::Error)
            .collect();

        if !failed.is_empty() {
            let _ = writeln!(out, "\n  ⚠️  ALERT: the following compilers BREAK the defense:");
            for r in &failed {
                let _ = writeln!(
                    out,
                    "     - {}: Balance {:.1}% (expected >50%)",
                    r.profile.display_name, r.measurement.min_balance_score
                );
            }
        }

        if !errored.is_empty() {
            let _ = writeln!(out, "\n  💥 The following compilers could not be measured:");
            for r in &errored {
                let first_line = r
                    .measurement
                    .error
                    .as_deref()
                    .and_then(|e| e.lines().next())
                    .unwrap_or("Unknown error");
                let _ = writeln!(out, "     - {}: {}", r.profile.display_name, first_line);
            }
        }

        if !failed.is_empty() {
            let _ = writeln!(out, "\n  Possible causes:");
            write_numbered(&mut out, &POSSIBLE_CAUSES);
            let _ = writeln!(out, "\n  Recommended fixes:");
            write_numbered(&mut out, &RECOMMENDED_FIXES);
        }

        if !errored.is_empty() {
            let _ = writeln!(out, "\n  For measurement errors:");
            write_numbered(&mut out, &ERROR_HINTS);
        }

        let passed: Vec<&AggregateResult> = results
            .iter()
            .filter(|r| r.verdict() == Verdict::Pass)
            .collect();
        if !passed.is_empty() {
            let _ = writeln!(out, "\n  ✅ Compilers that PRESERVE the defense:");
            for r in &passed {
                let _ = writeln!(
                    out,
                    "     - {}: Balance {:.1}%",
                    r.profile.display_name, r.measurement.min_balance_score
                );
            }
        }

        out
    }

    /// JSON report. Raw workload output is not included.
    pub fn render_json(results: &[AggregateResult]) -> serde_json::Result<String> {
        let report = JsonReport {
            generated_at: Utc::now(),
            harness_version: crate::VERSION,
            totals: VerdictCounts::tally(results),
            results: results
                .iter()
                .map(|r| {
                    let m = &r.measurement;
                    JsonEntry {
                        key: &r.profile.key,
                        display_name: &r.profile.display_name,
                        executable: &r.profile.executable,
                        flags: &r.profile.flags,
                        verdict: r.verdict(),
                        min_balance_score: m.success.then_some(m.min_balance_score),
                        hotspot_detected: m.hotspot_detected,
                        suspicious_patterns: m.suspicious_patterns,
                        blocked_redirects: m.blocked_redirects,
                        elapsed_ms: m.elapsed_ms,
                        error: m.error.as_deref(),
                        runs_attempted: r.runs_attempted,
                        runs_failed: r.runs_failed,
                    }
                })
                .collect(),
        };
        serde_json::to_string_pretty(&report)
    }
}

fn write_numbered(out: &mut String, lines: &[&str]) {
    for (i, line) in lines.iter().enumerate() {
        let _ = writeln!(out, "     {}. {}", i + 1, line);
    }
}
