//! A loaded project: manifest plus layered configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::errors::ConfigError;
use crate::core::framework::FrameworkConfig;
use crate::core::manifest::Manifest;
use crate::core::registry::PodRegistry;
use crate::core::source_set::{TargetFlags, TargetSet};
use crate::util::config::{load_config, project_config_path, CocoapodsConfig, Config};
use crate::util::context::GlobalContext;

pub const DEFAULT_CONFIGURATION: &str = "debug";
pub const DEFAULT_XCODEBUILD: &str = "xcodebuild";

/// Effective settings after every configuration layer is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub flags: TargetFlags,
    /// Absolute path of the pods project, if configured
    pub pods_project: Option<PathBuf>,
    /// Pods build configuration, lower-case (`debug`, `release`)
    pub configuration: String,
    pub xcodebuild: PathBuf,
    pub jobs: Option<usize>,
    pub keep_going: bool,
}

impl Settings {
    fn resolve(root: &Path, config: &Config) -> Settings {
        let defaults = TargetFlags::default();
        let flags = TargetFlags {
            use_ios_shortcut: config
                .targets
                .use_ios_shortcut
                .unwrap_or(defaults.use_ios_shortcut),
            include_simulator: config
                .targets
                .include_simulator
                .unwrap_or(defaults.include_simulator),
            ios_target_warning: config
                .targets
                .ios_target_warning
                .unwrap_or(defaults.ios_target_warning),
        };

        Settings {
            flags,
            pods_project: config.cocoapods.project.as_ref().map(|p| root.join(p)),
            configuration: config
                .cocoapods
                .configuration
                .as_deref()
                .unwrap_or(DEFAULT_CONFIGURATION)
                .to_lowercase(),
            xcodebuild: config
                .cocoapods
                .xcodebuild
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_XCODEBUILD)),
            jobs: config.build.jobs,
            keep_going: config.build.keep_going.unwrap_or(false),
        }
    }
}

/// A project rooted at the directory containing `Podforge.toml`.
#[derive(Debug, Clone)]
pub struct Project {
    manifest: Manifest,
    settings: Settings,
}

impl Project {
    /// Find and load the project around the context's working directory.
    ///
    /// Layers, lowest first: manifest, global config, project config,
    /// environment, then `overrides` (CLI flags).
    pub fn load(ctx: &GlobalContext, overrides: Config) -> Result<Project> {
        let manifest_path = ctx.find_manifest()?;
        let manifest = Manifest::load(&manifest_path)?;
        tracing::debug!("loaded manifest {}", manifest_path.display());

        let mut config = load_config(
            &ctx.global_config_path(),
            &project_config_path(&manifest.manifest_dir),
        );
        config.merge(Config::from_env());
        config.merge(overrides);

        Ok(Project::from_manifest(manifest, config))
    }

    /// Build a project from a parsed manifest and config layered on top of it.
    pub fn from_manifest(manifest: Manifest, config: Config) -> Project {
        let mut layered = Config {
            targets: manifest.targets.clone(),
            cocoapods: CocoapodsConfig {
                project: manifest.cocoapods.project.clone(),
                configuration: manifest.cocoapods.configuration.clone(),
                xcodebuild: None,
            },
            ..Config::default()
        };
        layered.merge(config);

        let settings = Settings::resolve(&manifest.manifest_dir, &layered);
        Project { manifest, settings }
    }

    pub fn root(&self) -> &Path {
        &self.manifest.manifest_dir
    }

    pub fn name(&self) -> String {
        self.manifest.name()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn framework(&self) -> &FrameworkConfig {
        &self.manifest.framework
    }

    /// Absolute build directory.
    pub fn build_dir(&self) -> PathBuf {
        self.root().join(&self.manifest.project.build_dir)
    }

    /// Absolute products root for precompiled pods, if configured.
    pub fn products_root(&self) -> Option<PathBuf> {
        self.manifest
            .cocoapods
            .products_root
            .as_ref()
            .map(|p| self.root().join(p))
    }

    /// Declare every manifest pod in a fresh registry.
    pub fn registry(&self) -> Result<PodRegistry> {
        let mut registry = match self.products_root() {
            Some(root) => PodRegistry::with_products_root(root),
            None => PodRegistry::new(),
        };

        for (index, entry) in self.manifest.cocoapods.pods.iter().enumerate() {
            let spec = entry
                .to_spec()
                .with_context(|| format!("invalid [[cocoapods.pod]] entry #{}", index + 1))?;
            registry.declare(spec)?;
        }

        Ok(registry)
    }

    pub fn target_set(&self) -> TargetSet {
        TargetSet::enumerate(&self.settings.flags)
    }

    /// The pods project, which must be configured and exist.
    pub fn require_pods_project(&self) -> Result<&Path, ConfigError> {
        let path = self
            .settings
            .pods_project
            .as_deref()
            .ok_or(ConfigError::PodsProjectUnset)?;
        if !path.exists() {
            return Err(ConfigError::PodsProjectMissing {
                path: path.to_path_buf(),
            });
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(content: &str) -> Manifest {
        Manifest::parse(content, Path::new("/work/app/Podforge.toml")).unwrap()
    }

    #[test]
    fn test_defaults() {
        let project = Project::from_manifest(manifest(""), Config::default());
        let settings = project.settings();

        assert_eq!(settings.flags, TargetFlags::default());
        assert_eq!(settings.configuration, "debug");
        assert_eq!(settings.xcodebuild, PathBuf::from("xcodebuild"));
        assert_eq!(settings.pods_project, None);
        assert!(!settings.keep_going);
        assert_eq!(project.build_dir(), PathBuf::from("/work/app/build"));
    }

    #[test]
    fn test_config_overrides_manifest() {
        let m = manifest(
            r#"
[targets]
include-simulator = false
use-ios-shortcut = false

[cocoapods]
project = "ios-app/Pods/Pods.xcodeproj"
configuration = "Debug"
"#,
        );

        let mut config = Config::default();
        config.targets.include_simulator = Some(true);
        config.cocoapods.configuration = Some("Release".to_string());

        let project = Project::from_manifest(m, config);
        let settings = project.settings();

        assert!(settings.flags.include_simulator);
        assert!(!settings.flags.use_ios_shortcut);
        assert_eq!(settings.configuration, "release");
        assert_eq!(
            settings.pods_project,
            Some(PathBuf::from("/work/app/ios-app/Pods/Pods.xcodeproj"))
        );
    }

    #[test]
    fn test_registry_from_manifest() {
        let m = manifest(
            r#"
[cocoapods]
products-root = "prebuilt"

[[cocoapods.pod]]
name = "AFNetworking"

[[cocoapods.pod]]
name = "GoogleMaps"
precompiled = true
"#,
        );
        let project = Project::from_manifest(m, Config::default());
        let registry = project.registry().unwrap();

        assert_eq!(registry.modules(), vec!["AFNetworking", "GoogleMaps"]);
        assert_eq!(registry.products_root(), Some(Path::new("/work/app/prebuilt")));
    }

    #[test]
    fn test_registry_rejects_bad_module() {
        let m = manifest(
            r#"
[[cocoapods.pod]]
scheme = "moko-widgets-flat"
"#,
        );
        let project = Project::from_manifest(m, Config::default());
        let err = project.registry().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidModuleName { .. })
        ));
    }

    #[test]
    fn test_require_pods_project() {
        let project = Project::from_manifest(manifest(""), Config::default());
        assert!(matches!(
            project.require_pods_project(),
            Err(ConfigError::PodsProjectUnset)
        ));

        let m = manifest("[cocoapods]\nproject = \"missing/Pods.xcodeproj\"\n");
        let project = Project::from_manifest(m, Config::default());
        assert!(matches!(
            project.require_pods_project(),
            Err(ConfigError::PodsProjectMissing { .. })
        ));
    }
}
