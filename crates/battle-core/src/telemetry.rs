//! Tracing subscriber setup.
//!
//! Call [`init_tracing`] once at program start. Log lines go to stderr so the
//! battle report printed on stdout stays clean for piping.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Harness-specific filter override, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "COMPILER_BATTLE_LOG";

/// Crates whose logs follow the requested level.
const HARNESS_TARGETS: [&str; 2] = ["battle_core", "compiler_battle"];

/// Filter used when no environment override is set: harness crates at
/// `level`, everything else (tokio, which) at `warn`.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(HARNESS_TARGETS.iter().map(|t| format!("{}={}", t, level)));
    directives.join(",")
}

fn build_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Initialise the global tracing subscriber.
///
/// * `json`: when `true`, emit newline-delimited JSON log lines.
/// * `level`: harness verbosity when neither `COMPILER_BATTLE_LOG` nor
///   `RUST_LOG` is set.
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let filter = build_filter(level);
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry().with(filter).with(layer).try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
