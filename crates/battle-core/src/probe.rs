//! Host toolchain discovery.

use crate::profile::ProfileRegistry;

/// Keys tried, in order, when the caller does not pick profiles.
pub const DEFAULT_PRIORITY: [&str; 3] = ["gcc-O3", "gcc-O2", "gcc-O3-no-licm"];

/// Intel toolchains; at most one of them joins the default selection.
pub const INTEL_PREFERENCE: [&str; 2] = ["icpx", "icx"];

/// Checks which profiles' executables resolve on the search path.
///
/// Only performs path lookups; nothing is executed.
pub struct ToolchainProbe;

impl ToolchainProbe {
    /// Keys whose executable is resolvable on `PATH`, in registry order.
    pub fn detect_available(registry: &ProfileRegistry) -> Vec<String> {
        registry
            .iter()
            .filter(|p| Self::is_resolvable(&p.executable))
            .map(|p| p.key.clone())
            .collect()
    }

    /// Whether a program name resolves to an executable.
    pub fn is_resolvable(executable: &str) -> bool {
        which::which(executable).is_ok()
    }

    /// Narrow a detected set down to the default battle: the GCC baseline
    /// trio, then the first available Intel toolchain.
    pub fn default_selection(available: &[String]) -> Vec<String> {
        let has = |key: &str| available.iter().any(|a| a == key);

        let mut keys: Vec<String> = DEFAULT_PRIORITY
            .iter()
            .filter(|k| has(k))
            .map(|k| k.to_string())
            .collect();

        if let Some(intel) = INTEL_PREFERENCE.iter().find(|k| has(k)) {
            keys.push(intel.to_string());
        }
        keys
    }
}
