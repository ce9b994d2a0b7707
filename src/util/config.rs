//! Configuration file support for Podforge.
//!
//! Two configuration file locations are read on top of the manifest:
//! - Global: `~/.podforge/config.toml` - User-wide defaults
//! - Project: `.podforge/config.toml` - Project-specific overrides
//!
//! Environment variables (`PODFORGE_*`) override both, and CLI flags
//! override everything.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the pods project.
pub const ENV_PODS_PROJECT: &str = "PODFORGE_PODS_PROJECT";
pub const ENV_PODS_CONFIGURATION: &str = "PODFORGE_PODS_CONFIGURATION";
pub const ENV_USE_IOS_SHORTCUT: &str = "PODFORGE_USE_IOS_SHORTCUT";
pub const ENV_INCLUDE_SIMULATOR: &str = "PODFORGE_INCLUDE_SIMULATOR";
pub const ENV_IOS_TARGET_WARNING: &str = "PODFORGE_IOS_TARGET_WARNING";
pub const ENV_XCODEBUILD: &str = "PODFORGE_XCODEBUILD";

/// Podforge configuration.
///
/// Every field is optional so layers can be merged without losing values
/// set by a lower layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub targets: TargetsConfig,
    pub cocoapods: CocoapodsConfig,
    pub build: BuildConfig,
}

/// Target enumeration overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetsConfig {
    pub use_ios_shortcut: Option<bool>,
    pub include_simulator: Option<bool>,
    pub ios_target_warning: Option<bool>,
}

/// CocoaPods toolchain overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CocoapodsConfig {
    /// Pods project, relative to the project root
    pub project: Option<PathBuf>,

    /// Build configuration passed to xcodebuild (`debug`, `release`)
    pub configuration: Option<String>,

    /// xcodebuild executable
    pub xcodebuild: Option<PathBuf>,
}

/// Executor settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Parallel steps (None = number of CPUs)
    pub jobs: Option<usize>,

    /// Keep running independent steps after a failure
    pub keep_going: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Read the `PODFORGE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).and_then(|value| parse_bool(key, &value));
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Config {
            targets: TargetsConfig {
                use_ios_shortcut: flag(ENV_USE_IOS_SHORTCUT),
                include_simulator: flag(ENV_INCLUDE_SIMULATOR),
                ios_target_warning: flag(ENV_IOS_TARGET_WARNING),
            },
            cocoapods: CocoapodsConfig {
                project: non_empty(ENV_PODS_PROJECT).map(PathBuf::from),
                configuration: non_empty(ENV_PODS_CONFIGURATION),
                xcodebuild: non_empty(ENV_XCODEBUILD).map(PathBuf::from),
            },
            build: BuildConfig::default(),
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.targets.use_ios_shortcut.is_some() {
            self.targets.use_ios_shortcut = other.targets.use_ios_shortcut;
        }
        if other.targets.include_simulator.is_some() {
            self.targets.include_simulator = other.targets.include_simulator;
        }
        if other.targets.ios_target_warning.is_some() {
            self.targets.ios_target_warning = other.targets.ios_target_warning;
        }

        if other.cocoapods.project.is_some() {
            self.cocoapods.project = other.cocoapods.project;
        }
        if other.cocoapods.configuration.is_some() {
            self.cocoapods.configuration = other.cocoapods.configuration;
        }
        if other.cocoapods.xcodebuild.is_some() {
            self.cocoapods.xcodebuild = other.cocoapods.xcodebuild;
        }

        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.keep_going.is_some() {
            self.build.keep_going = other.build.keep_going;
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        other => {
            tracing::warn!("ignoring {}={:?}: expected true or false", key, other);
            None
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.podforge/config.toml)
/// 2. Global config (~/.podforge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the project config path (.podforge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".podforge").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.targets.use_ios_shortcut.is_none());
        assert!(config.cocoapods.project.is_none());
        assert!(config.build.jobs.is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[targets]
include-simulator = true

[cocoapods]
configuration = "release"
xcodebuild = "/opt/xcode/xcodebuild"

[build]
jobs = 8
keep-going = true
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.targets.include_simulator, Some(true));
        assert_eq!(config.cocoapods.configuration, Some("release".to_string()));
        assert_eq!(
            config.cocoapods.xcodebuild,
            Some(PathBuf::from("/opt/xcode/xcodebuild"))
        );
        assert_eq!(config.build.jobs, Some(8));
        assert_eq!(config.build.keep_going, Some(true));
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.cocoapods.configuration = Some("debug".to_string());
        base.build.jobs = Some(4);

        let mut override_cfg = Config::default();
        override_cfg.cocoapods.configuration = Some("release".to_string());

        base.merge(override_cfg);

        assert_eq!(base.cocoapods.configuration, Some("release".to_string()));
        assert_eq!(base.build.jobs, Some(4)); // Not overridden
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_PODS_PROJECT, "ios-app/Pods/Pods.xcodeproj"),
            (ENV_USE_IOS_SHORTCUT, "false"),
            (ENV_INCLUDE_SIMULATOR, "1"),
            (ENV_IOS_TARGET_WARNING, "maybe"),
            (ENV_PODS_CONFIGURATION, ""),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.cocoapods.project,
            Some(PathBuf::from("ios-app/Pods/Pods.xcodeproj"))
        );
        assert_eq!(config.targets.use_ios_shortcut, Some(false));
        assert_eq!(config.targets.include_simulator, Some(true));
        // Unparseable and empty values are ignored
        assert_eq!(config.targets.ios_target_warning, None);
        assert_eq!(config.cocoapods.configuration, None);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[cocoapods]
configuration = "release"
xcodebuild = "/usr/bin/xcodebuild"

[build]
jobs = 2
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[build]
jobs = 6
"#,
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);

        assert_eq!(config.build.jobs, Some(6));
        assert_eq!(config.cocoapods.configuration, Some("release".to_string()));
        assert_eq!(
            config.cocoapods.xcodebuild,
            Some(PathBuf::from("/usr/bin/xcodebuild"))
        );
    }

    #[test]
    fn test_broken_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[build\njobs = ").unwrap();

        assert_eq!(Config::load_or_default(&path), Config::default());
    }
}
