//! Verdict policy for a measurement.

use crate::runner::Measurement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Balance at or above this holds under adversarial load.
pub const PASS_THRESHOLD: f64 = 50.0;

/// Balance below this means the defense is effectively defeated.
pub const FAIL_THRESHOLD: f64 = 20.0;

/// Classification of one profile's representative measurement.
///
/// Declared best to worst; `Ord` follows that order for successful runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Defense holds.
    Pass,

    /// Defense partially degraded.
    Warn,

    /// Defense defeated.
    Fail,

    /// Build or run did not complete.
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Warn => "WARN",
            Verdict::Fail => "FAIL",
            Verdict::Error => "ERROR",
        }
    }

    /// Status glyph shown next to the verdict.
    pub fn glyph(&self) -> &'static str {
        match self {
            Verdict::Pass => "✅",
            Verdict::Warn => "⚠️",
            Verdict::Fail => "❌",
            Verdict::Error => "💥",
        }
    }

    /// Verdict for a successful run with the given balance score.
    pub fn from_score(score: f64) -> Self {
        if score >= PASS_THRESHOLD {
            Verdict::Pass
        } else if score >= FAIL_THRESHOLD {
            Verdict::Warn
        } else {
            Verdict::Fail
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a measurement. Failed outcomes are always `Error`.
pub fn classify(measurement: &Measurement) -> Verdict {
    if !measurement.success {
        return Verdict::Error;
    }
    Verdict::from_score(measurement.min_balance_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::extract;

    fn ok(score: f64) -> Measurement {
        let mut m = Measurement::observed("p", Default::default(), 1, String::new());
        m.min_balance_score = score;
        m
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(classify(&ok(100.0)), Verdict::Pass);
        assert_eq!(classify(&ok(50.0)), Verdict::Pass);
        assert_eq!(classify(&ok(49.9)), Verdict::Warn);
        assert_eq!(classify(&ok(20.0)), Verdict::Warn);
        assert_eq!(classify(&ok(19.99)), Verdict::Fail);
        assert_eq!(classify(&ok(0.0)), Verdict::Fail);
    }

    #[test]
    fn test_failed_outcome_is_error_regardless_of_score() {
        let mut m = Measurement::failed("p", "Benchmark timeout after 60s", 60_000, String::new());
        assert_eq!(classify(&m), Verdict::Error);
        m.min_balance_score = 99.0;
        assert_eq!(classify(&m), Verdict::Error);
    }

    #[test]
    fn test_monotonic_in_score() {
        let scores: Vec<f64> = (0..=1000).map(|i| i as f64 / 10.0).collect();
        for pair in scores.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            assert!(
                classify(&ok(higher)) <= classify(&ok(lower)),
                "score {} classified worse than {}",
                higher,
                lower
            );
        }
    }

    #[test]
    fn test_synthetic_outputs() {
        let pass = extract("Balance: 73.2%\nHotspot: No\nSuspicious: 4\nBlocked: 2");
        let m = Measurement::observed("p", pass, 1, String::new());
        assert_eq!(classify(&m), Verdict::Pass);

        let fail = extract("Balance: 80.0%\nBalance: 15.0%");
        let m = Measurement::observed("p", fail, 1, String::new());
        assert_eq!(classify(&m), Verdict::Fail);

        let silent = extract("no metrics at all");
        let m = Measurement::observed("p", silent, 1, String::new());
        assert_eq!(classify(&m), Verdict::Fail);
    }

    #[test]
    fn test_display_and_serde_names() {
        assert_eq!(Verdict::Warn.to_string(), "WARN");
        assert_eq!(serde_json::to_string(&Verdict::Error).unwrap(), "\"ERROR\"");
        assert_eq!(Verdict::Fail.glyph(), "❌");
    }
}
