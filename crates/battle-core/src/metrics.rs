//! Metric extraction from the workload's raw output.
//!
//! The workload prints any number of these lines, interleaved with anything
//! else:
//!
//! ```text
//! Balance: <float>%
//! Hotspot: YES | No
//! Suspicious: <integer>
//! Blocked: <integer>
//! ```
//!
//! Missing patterns degrade to defaults; extraction never fails.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Metrics pulled from one run's output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Lowest balance snapshot, in percent (0.0 if none).
    pub min_balance_score: f64,

    /// True if any snapshot reported `Hotspot: YES`.
    pub hotspot_detected: bool,

    /// Sum of all `Suspicious:` counts.
    pub suspicious_patterns: u64,

    /// Sum of all `Blocked:` counts.
    pub blocked_redirects: u64,
}

struct Patterns {
    balance: Regex,
    hotspot: Regex,
    suspicious: Regex,
    blocked: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        // Literal patterns; compilation cannot fail.
        balance: Regex::new(r"Balance:\s+([\d.]+)%").expect("balance pattern"),
        hotspot: Regex::new(r"Hotspot:\s+(YES|No)").expect("hotspot pattern"),
        suspicious: Regex::new(r"Suspicious:\s+(\d+)").expect("suspicious pattern"),
        blocked: Regex::new(r"Blocked:\s+(\d+)").expect("blocked pattern"),
    })
}

/// Parse a run's combined output.
///
/// Balance is the minimum over all snapshots, clamped to `0..=100`;
/// suspicious and blocked counts are summed.
pub fn extract(raw: &str) -> Metrics {
    let p = patterns();

    let min_balance_score = p
        .balance
        .captures_iter(raw)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .fold(None, |min: Option<f64>, v| Some(min.map_or(v, |m| m.min(v))))
        .map(|v| v.clamp(0.0, 100.0))
        .unwrap_or(0.0);

    let hotspot_detected = p.hotspot.captures_iter(raw).any(|c| &c[1] == "YES");

    Metrics {
        min_balance_score,
        hotspot_detected,
        suspicious_patterns: sum_counts(&p.suspicious, raw),
        blocked_redirects: sum_counts(&p.blocked, raw),
    }
}

fn sum_counts(pattern: &Regex, raw: &str) -> u64 {
    pattern
        .captures_iter(raw)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .fold(0u64, u64::saturating_add)
}
