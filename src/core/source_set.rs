//! Target and source-set enumeration.
//!
//! Decides which native targets are active and how source directories are
//! laid out, for both the Apple and Android sides of a library.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::target::NativeTarget;

/// Android source sets and the roots they are moved to.
pub const ANDROID_SOURCE_ROOTS: &[(&str, &str)] = &[
    ("main", "src/androidMain"),
    ("release", "src/androidMainRelease"),
    ("debug", "src/androidMainDebug"),
    ("test", "src/androidUnitTest"),
    ("testRelease", "src/androidUnitTestRelease"),
    ("testDebug", "src/androidUnitTestDebug"),
];

/// Location of the Android manifest after relocation.
pub const ANDROID_MANIFEST: &str = "src/androidMain/AndroidManifest.xml";

/// Inputs to target enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetFlags {
    /// Group the iOS targets under shared `iosMain`/`iosTest` source sets
    pub use_ios_shortcut: bool,
    /// Also build for the arm64 simulator
    pub include_simulator: bool,
    /// Log which iOS target layout is used
    pub ios_target_warning: bool,
}

impl Default for TargetFlags {
    fn default() -> Self {
        TargetFlags {
            use_ios_shortcut: true,
            include_simulator: false,
            ios_target_warning: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IosMode {
    Shortcut,
    Explicit,
}

/// A source set: a named directory of sources with parent source sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSet {
    pub name: String,
    pub root: PathBuf,
    #[serde(rename = "depends-on", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// The enabled targets and the resulting source layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSet {
    pub mode: IosMode,
    /// Apple targets in activation order
    pub apple_targets: Vec<NativeTarget>,
    pub source_sets: BTreeMap<String, SourceSet>,
    /// Android source set name to relocated root
    pub android_roots: BTreeMap<String, PathBuf>,
    pub android_manifest: PathBuf,
}

impl TargetSet {
    /// Compute the target set for `flags`.
    pub fn enumerate(flags: &TargetFlags) -> TargetSet {
        let mode = if flags.use_ios_shortcut {
            IosMode::Shortcut
        } else {
            IosMode::Explicit
        };

        if flags.ios_target_warning {
            match mode {
                IosMode::Shortcut => tracing::warn!("used new ios() shortcut target"),
                IosMode::Explicit => tracing::warn!("used old iosArm64() and iosX64() targets"),
            }
        }

        let mut apple_targets = vec![NativeTarget::IosArm64, NativeTarget::IosX64];
        if flags.include_simulator {
            apple_targets.push(NativeTarget::IosSimulatorArm64);
        }

        let mut layout = Layout::default();
        layout.add("commonMain", &[]);
        layout.add("commonTest", &["commonMain"]);
        layout.add("androidMain", &["commonMain"]);
        layout.add("androidUnitTest", &["commonTest", "androidMain"]);

        let (main_parent, test_parent) = match mode {
            IosMode::Shortcut => {
                layout.add("iosMain", &["commonMain"]);
                layout.add("iosTest", &["commonTest", "iosMain"]);
                ("iosMain", "iosTest")
            }
            IosMode::Explicit => ("commonMain", "commonTest"),
        };

        for target in &apple_targets {
            let main = format!("{}Main", target.name());
            let test = format!("{}Test", target.name());
            layout.add(&main, &[main_parent]);
            layout.add(&test, &[test_parent, main.as_str()]);
        }

        let android_roots = ANDROID_SOURCE_ROOTS
            .iter()
            .map(|(name, root)| {
                tracing::debug!("android source set `{}` moved to {}", name, root);
                (name.to_string(), PathBuf::from(root))
            })
            .collect();

        TargetSet {
            mode,
            apple_targets,
            source_sets: layout.sets,
            android_roots,
            android_manifest: PathBuf::from(ANDROID_MANIFEST),
        }
    }

    pub fn contains(&self, target: NativeTarget) -> bool {
        self.apple_targets.contains(&target)
    }

    pub fn source_set(&self, name: &str) -> Option<&SourceSet> {
        self.source_sets.get(name)
    }

    /// Names of the enabled Apple targets.
    pub fn target_names(&self) -> Vec<String> {
        self.apple_targets.iter().map(|t| t.name().to_string()).collect()
    }
}

#[derive(Default)]
struct Layout {
    sets: BTreeMap<String, SourceSet>,
}

impl Layout {
    fn add(&mut self, name: &str, depends_on: &[&str]) {
        self.sets.insert(
            name.to_string(),
            SourceSet {
                name: name.to_string(),
                root: PathBuf::from("src").join(name),
                depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(shortcut: bool, simulator: bool) -> TargetFlags {
        TargetFlags {
            use_ios_shortcut: shortcut,
            include_simulator: simulator,
            ios_target_warning: false,
        }
    }

    #[test]
    fn test_default_flags() {
        let flags = TargetFlags::default();
        assert!(flags.use_ios_shortcut);
        assert!(!flags.include_simulator);
        assert!(flags.ios_target_warning);
    }

    #[test]
    fn test_shortcut_with_simulator() {
        let set = TargetSet::enumerate(&flags(true, true));

        assert_eq!(set.mode, IosMode::Shortcut);
        assert_eq!(
            set.apple_targets,
            vec![
                NativeTarget::IosArm64,
                NativeTarget::IosX64,
                NativeTarget::IosSimulatorArm64
            ]
        );

        let sim_main = set.source_set("iosSimulatorArm64Main").unwrap();
        assert_eq!(sim_main.depends_on, vec!["iosMain"]);
        let sim_test = set.source_set("iosSimulatorArm64Test").unwrap();
        assert!(sim_test.depends_on.contains(&"iosTest".to_string()));
        assert!(set.source_set("iosMain").is_some());
    }

    #[test]
    fn test_explicit_targets() {
        let set = TargetSet::enumerate(&flags(false, false));

        assert_eq!(set.mode, IosMode::Explicit);
        assert_eq!(
            set.apple_targets,
            vec![NativeTarget::IosArm64, NativeTarget::IosX64]
        );
        assert!(set.source_set("iosMain").is_none());
        assert_eq!(
            set.source_set("iosX64Main").unwrap().depends_on,
            vec!["commonMain"]
        );
    }

    #[test]
    fn test_android_layout_always_present() {
        for set in [
            TargetSet::enumerate(&flags(true, false)),
            TargetSet::enumerate(&flags(false, true)),
        ] {
            assert_eq!(set.android_roots["main"], PathBuf::from("src/androidMain"));
            assert_eq!(
                set.android_roots["testDebug"],
                PathBuf::from("src/androidUnitTestDebug")
            );
            assert_eq!(set.android_roots.len(), 6);
            assert_eq!(
                set.android_manifest,
                PathBuf::from("src/androidMain/AndroidManifest.xml")
            );
            assert!(set.source_set("commonMain").is_some());
            assert!(set.source_set("androidMain").is_some());
        }
    }

    #[test]
    fn test_target_names() {
        let set = TargetSet::enumerate(&flags(true, false));
        assert_eq!(set.target_names(), vec!["iosArm64", "iosX64"]);
        assert!(set.contains(NativeTarget::IosX64));
        assert!(!set.contains(NativeTarget::IosSimulatorArm64));
    }
}
