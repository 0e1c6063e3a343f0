//! Compiler profile definitions and the ordered profile registry.

use crate::error::{BattleError, BattleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named toolchain + flag combination the workload is built with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompilerProfile {
    /// Unique registry key (e.g. `gcc-O3`).
    pub key: String,

    /// Human-readable label used in reports.
    pub display_name: String,

    /// Toolchain executable, resolved on `PATH`.
    pub executable: String,

    /// Flags passed before the include/source/output arguments.
    pub flags: Vec<String>,

    /// One-line description shown by `--list`.
    pub description: String,
}

impl CompilerProfile {
    /// Create a profile from borrowed parts.
    pub fn new(
        key: &str,
        display_name: &str,
        executable: &str,
        flags: &[&str],
        description: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            executable: executable.to_string(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            description: description.to_string(),
        }
    }

    /// Artifact file stem for this profile, unique per key.
    pub fn artifact_stem(&self) -> String {
        format!("adversarial_{}", self.key.replace('-', "_"))
    }
}

/// Read-only, ordered catalog of compiler profiles.
///
/// Registration order is the default battle order: baseline optimization
/// levels, then experimental mitigations, then third-party toolchains.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<CompilerProfile>,
    index: HashMap<String, usize>,
}

impl ProfileRegistry {
    /// Build a registry from an ordered list of profiles.
    pub fn new(profiles: Vec<CompilerProfile>) -> BattleResult<Self> {
        let mut index = HashMap::with_capacity(profiles.len());
        for (pos, profile) in profiles.iter().enumerate() {
            if index.insert(profile.key.clone(), pos).is_some() {
                return Err(BattleError::DuplicateProfile(profile.key.clone()));
            }
        }
        Ok(Self { profiles, index })
    }

    /// The built-in GCC / Intel / Clang catalog.
    pub fn builtin() -> Self {
        const GCC_BASE: [&str; 5] = ["-std=c++17", "-O3", "-Wall", "-Wextra", "-pthread"];

        let profiles = vec![
            CompilerProfile::new(
                "gcc-O3",
                "GCC -O3",
                "g++",
                &GCC_BASE,
                "GCC with aggressive optimization (may break the defense on hybrid CPUs)",
            ),
            CompilerProfile::new(
                "gcc-O2",
                "GCC -O2",
                "g++",
                &["-std=c++17", "-O2", "-Wall", "-Wextra", "-pthread"],
                "GCC with moderate optimization",
            ),
            CompilerProfile::new(
                "gcc-O3-no-licm",
                "GCC -O3 (no LICM)",
                "g++",
                &["-std=c++17", "-O3", "-fno-tree-loop-im", "-Wall", "-Wextra", "-pthread"],
                "GCC -O3 with Loop Invariant Code Motion disabled",
            ),
            CompilerProfile::new(
                "gcc-O3-barrier",
                "GCC -O3 + Barrier Fix",
                "g++",
                &["-std=c++17", "-O3", "-DUSE_COMPILER_BARRIER", "-Wall", "-Wextra", "-pthread"],
                "GCC -O3 with the compiler barrier enabled",
            ),
            CompilerProfile::new(
                "icpx",
                "Intel ICX",
                "icpx",
                &["-std=c++17", "-O3", "-Wall", "-pthread"],
                "Intel oneAPI DPC++/C++ Compiler",
            ),
            CompilerProfile::new(
                "icx",
                "Intel ICX (legacy)",
                "icx",
                &["-std=c++17", "-O3", "-Wall", "-pthread"],
                "Intel C++ Compiler (legacy name)",
            ),
            CompilerProfile::new(
                "clang",
                "Clang -O3",
                "clang++",
                &GCC_BASE,
                "LLVM Clang for reference",
            ),
        ];

        // Keys above are literals and distinct.
        let index = profiles
            .iter()
            .enumerate()
            .map(|(pos, p)| (p.key.clone(), pos))
            .collect();
        Self { profiles, index }
    }

    /// Look up a profile by key.
    pub fn get(&self, key: &str) -> BattleResult<&CompilerProfile> {
        self.index
            .get(key)
            .map(|&pos| &self.profiles[pos])
            .ok_or_else(|| BattleError::UnknownProfile {
                key: key.to_string(),
                available: self.keys().map(str::to_string).collect(),
            })
    }

    /// Whether `key` names a registered profile.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// All keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.key.as_str())
    }

    /// All profiles in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CompilerProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order_is_battle_order() {
        let registry = ProfileRegistry::builtin();
        let keys: Vec<&str> = registry.keys().collect();
        assert_eq!(
            keys,
            vec!["gcc-O3", "gcc-O2", "gcc-O3-no-licm", "gcc-O3-barrier", "icpx", "icx", "clang"]
        );
    }

    #[test]
    fn test_lookup_known_profile() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.get("gcc-O3-no-licm").expect("profile exists");
        assert_eq!(profile.executable, "g++");
        assert!(profile.flags.contains(&"-fno-tree-loop-im".to_string()));
        assert_eq!(profile.display_name, "GCC -O3 (no LICM)");
    }

    #[test]
    fn test_lookup_unknown_profile() {
        let registry = ProfileRegistry::builtin();
        match registry.get("msvc") {
            Err(BattleError::UnknownProfile { key, available }) => {
                assert_eq!(key, "msvc");
                assert_eq!(available.len(), registry.len());
            }
            other => panic!("expected UnknownProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let p = CompilerProfile::new("dup", "Dup", "cc", &[], "");
        let result = ProfileRegistry::new(vec![p.clone(), p]);
        assert!(matches!(result, Err(BattleError::DuplicateProfile(k)) if k == "dup"));
    }

    #[test]
    fn test_artifact_stem_is_key_derived() {
        let registry = ProfileRegistry::builtin();
        let stem = registry.get("gcc-O3-barrier").unwrap().artifact_stem();
        assert_eq!(stem, "adversarial_gcc_O3_barrier");
    }

    #[test]
    fn test_custom_registry_preserves_order() {
        let registry = ProfileRegistry::new(vec![
            CompilerProfile::new("zeta", "Zeta", "cc", &[], ""),
            CompilerProfile::new("alpha", "Alpha", "cc", &[], ""),
        ])
        .unwrap();
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert!(registry.contains("alpha"));
        assert!(!registry.contains("beta"));
    }
}
