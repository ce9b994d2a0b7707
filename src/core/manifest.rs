//! Podforge.toml manifest parsing and schema.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::errors::ConfigError;
use crate::core::framework::FrameworkConfig;
use crate::core::pod::{PodSpec, SearchPathResolver};
use crate::util::config::TargetsConfig;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Podforge.toml";

/// `[project]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProjectMetadata {
    pub name: Option<String>,
    /// Build directory, relative to the project root
    pub build_dir: PathBuf,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        ProjectMetadata {
            name: None,
            build_dir: PathBuf::from("build"),
        }
    }
}

/// `[cocoapods]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CocoapodsSection {
    pub project: Option<PathBuf>,
    pub configuration: Option<String>,
    /// Base directory for precompiled pods
    pub products_root: Option<PathBuf>,
    #[serde(rename = "pod")]
    pub pods: Vec<PodEntry>,
}

/// One `[[cocoapods.pod]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PodEntry {
    /// Shorthand for `scheme = module = name`
    pub name: Option<String>,
    pub scheme: Option<String>,
    pub module: Option<String>,
    pub only_link: bool,
    pub precompiled: bool,
    pub extra_modules: Vec<String>,
    pub extra_linker_opts: Vec<String>,
    pub search_paths: Option<Vec<String>>,
}

impl PodEntry {
    /// Convert to a declaration.
    pub fn to_spec(&self) -> Result<PodSpec> {
        let scheme = match (&self.scheme, &self.name) {
            (Some(scheme), _) => scheme.clone(),
            (None, Some(name)) => name.clone(),
            (None, None) => anyhow::bail!("pod entry needs either `name` or `scheme`"),
        };

        let mut spec = PodSpec::new(scheme)
            .only_link(self.only_link)
            .precompiled(self.precompiled)
            .extra_modules(self.extra_modules.iter().cloned())
            .extra_linker_opts(self.extra_linker_opts.iter().cloned());

        if let Some(module) = self.module.as_ref().or(self.name.as_ref()) {
            spec = spec.module(module.clone());
        }

        if let Some(ref templates) = self.search_paths {
            if !self.precompiled {
                tracing::warn!(
                    "`search-paths` is only used by precompiled pods; ignored for `{}`",
                    spec.module_name()
                );
            }
            spec = spec.search_paths(SearchPathResolver::Templates(templates.clone()));
        }

        Ok(spec)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct RawManifest {
    project: ProjectMetadata,
    targets: TargetsConfig,
    framework: FrameworkConfig,
    cocoapods: CocoapodsSection,
}

/// The parsed Podforge.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub project: ProjectMetadata,
    pub targets: TargetsConfig,
    pub framework: FrameworkConfig,
    pub cocoapods: CocoapodsSection,
    /// Directory containing the manifest (the project root)
    pub manifest_dir: PathBuf,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| ConfigError::ManifestParse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        Ok(Manifest {
            project: raw.project,
            targets: raw.targets,
            framework: raw.framework,
            cocoapods: raw.cocoapods,
            manifest_dir,
        })
    }

    /// Project name, falling back to the root directory name.
    pub fn name(&self) -> String {
        self.project.name.clone().unwrap_or_else(|| {
            self.manifest_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string())
        })
    }
}

/// Find `Podforge.toml` in `dir` or any parent directory.
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = dir.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ConfigError::ManifestNotFound {
                dir: dir.to_path_buf(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::framework::Export;
    use tempfile::TempDir;

    const FULL: &str = r#"
[project]
name = "mpp-library"

[targets]
use-ios-shortcut = false
include-simulator = true

[framework]
name = "MultiPlatformLibrary"
exports = ["dev.icerock.moko:mvvm", { arm64 = "a-arm64", x64 = "a-x64" }]

[framework.link]
program = "./gradlew"
args = ["link{Configuration}Framework{Target}"]

[cocoapods]
project = "ios-app/Pods/Pods.xcodeproj"
configuration = "release"
products-root = "prebuilt"

[[cocoapods.pod]]
name = "AFNetworking"

[[cocoapods.pod]]
scheme = "moko-widgets-flat"
module = "mokoWidgetsFlat"
extra-modules = ["Extra"]
extra-linker-opts = ["-lz"]

[[cocoapods.pod]]
name = "GoogleMaps"
precompiled = true
only-link = true
search-paths = ["{root}/{arch}/GoogleMaps"]
"#;

    #[test]
    fn test_parse_full_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);

        let manifest = Manifest::parse(FULL, &path).unwrap();
        assert_eq!(manifest.name(), "mpp-library");
        assert_eq!(manifest.project.build_dir, PathBuf::from("build"));
        assert_eq!(manifest.targets.use_ios_shortcut, Some(false));
        assert_eq!(manifest.targets.include_simulator, Some(true));
        assert_eq!(manifest.targets.ios_target_warning, None);
        assert_eq!(manifest.framework.exports.len(), 2);
        assert!(matches!(manifest.framework.exports[1], Export::PerArch { .. }));
        assert_eq!(manifest.framework.link.as_ref().unwrap().program, "./gradlew");
        assert_eq!(
            manifest.cocoapods.project,
            Some(PathBuf::from("ios-app/Pods/Pods.xcodeproj"))
        );
        assert_eq!(manifest.cocoapods.pods.len(), 3);
        assert_eq!(manifest.manifest_dir, tmp.path());
    }

    #[test]
    fn test_pod_entries_to_specs() {
        let manifest = Manifest::parse(FULL, Path::new("/proj/Podforge.toml")).unwrap();
        let specs: Vec<_> = manifest
            .cocoapods
            .pods
            .iter()
            .map(|p| p.to_spec().unwrap())
            .collect();

        assert_eq!(specs[0].module_name(), "AFNetworking");
        assert_eq!(specs[1].module_name(), "mokoWidgetsFlat");
        assert!(specs[2].is_precompiled());
    }

    #[test]
    fn test_pod_entry_requires_name_or_scheme() {
        let entry = PodEntry::default();
        assert!(entry.to_spec().is_err());
    }

    #[test]
    fn test_empty_manifest_uses_defaults() {
        let manifest = Manifest::parse("", Path::new("/work/app/Podforge.toml")).unwrap();
        assert_eq!(manifest.name(), "app");
        assert_eq!(manifest.framework.name, "MultiPlatformLibrary");
        assert!(manifest.cocoapods.pods.is_empty());
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let err = Manifest::parse("[cocoapods\nproject = ", Path::new("/p/Podforge.toml"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ManifestParse { .. })
        ));
    }

    #[test]
    fn test_unknown_pod_key_is_rejected() {
        let content = r#"
[[cocoapods.pod]]
name = "AFNetworking"
onlyLink = true
"#;
        assert!(Manifest::parse(content, Path::new("/p/Podforge.toml")).is_err());
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&manifest, "").unwrap();
        let nested = tmp.path().join("src/iosMain/kotlin");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_manifest(&nested).unwrap(), manifest);
    }

    #[test]
    fn test_find_manifest_missing() {
        let tmp = TempDir::new().unwrap();
        let err = find_manifest(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ManifestNotFound { .. }));
    }
}
