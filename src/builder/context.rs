//! Build context - toolchain, configuration and output layout.

use std::path::{Path, PathBuf};

use crate::core::framework::FrameworkConfig;
use crate::core::project::Project;
use crate::core::target::{capitalize, Arch, NativeTarget, Sdk};

/// Everything a step needs to know about where it reads and writes.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub project_name: String,

    /// Project root (directory containing Podforge.toml)
    pub project_root: PathBuf,

    /// Absolute build directory
    pub build_dir: PathBuf,

    /// Pods project passed to `xcodebuild -project`
    pub pods_project: Option<PathBuf>,

    /// Build configuration, lower-case (`debug`, `release`)
    pub configuration: String,

    /// xcodebuild executable
    pub xcodebuild: PathBuf,

    pub framework: FrameworkConfig,
}

impl BuildContext {
    pub fn new(project: &Project) -> Self {
        let settings = project.settings();
        BuildContext {
            project_name: project.name(),
            project_root: project.root().to_path_buf(),
            build_dir: project.build_dir(),
            pods_project: settings.pods_project.clone(),
            configuration: settings.configuration.clone(),
            xcodebuild: settings.xcodebuild.clone(),
            framework: project.framework().clone(),
        }
    }

    /// Configuration as Xcode spells it (`Debug`).
    pub fn xcode_configuration(&self) -> String {
        capitalize(&self.configuration)
    }

    /// Root of everything podforge writes: `build/cocoapods`.
    pub fn cocoapods_dir(&self) -> PathBuf {
        self.build_dir.join("cocoapods")
    }

    /// SYMROOT for one (sdk, arch) pair.
    pub fn symroot(&self, sdk: Sdk, arch: Arch) -> PathBuf {
        self.cocoapods_dir().join(format!("{}-{}", sdk, arch))
    }

    /// Derived data for one pod compile.
    pub fn derived_data(&self, module: &str, sdk: Sdk, arch: Arch) -> PathBuf {
        self.cocoapods_dir()
            .join("DerivedData")
            .join(format!("{}-{}-{}", module, sdk, arch))
    }

    /// Where xcodebuild leaves the frameworks of one (sdk, arch) pair.
    pub fn frameworks_dir(&self, sdk: Sdk, arch: Arch) -> PathBuf {
        self.symroot(sdk, arch)
            .join("UninstalledProducts")
            .join(sdk.as_str())
    }

    pub fn def_file(&self, target: NativeTarget, module: &str) -> PathBuf {
        self.cocoapods_dir()
            .join("def")
            .join(target.name())
            .join(format!("{}.def", module))
    }

    pub fn settings_file(&self, target: NativeTarget) -> PathBuf {
        self.cocoapods_dir()
            .join("settings")
            .join(format!("{}.json", target.name()))
    }

    /// Stable location the linked framework is synced to.
    pub fn sync_dest(&self) -> PathBuf {
        self.cocoapods_dir().join("framework")
    }

    /// Where the host build leaves the framework for `target`.
    pub fn framework_output_dir(&self, target: NativeTarget) -> PathBuf {
        self.project_root
            .join(self.framework.output_dir_for(target, &self.configuration))
    }

    /// Path shown in logs, relative to the project root when possible.
    pub fn display_path(&self, path: &Path) -> String {
        crate::util::fs::relative_path(&self.project_root, path)
            .display()
            .to_string()
    }
}

#[cfg(test)]
pub(crate) fn test_context(root: &Path) -> BuildContext {
    BuildContext {
        project_name: "mpp-library".to_string(),
        project_root: root.to_path_buf(),
        build_dir: root.join("build"),
        pods_project: Some(root.join("ios-app/Pods/Pods.xcodeproj")),
        configuration: "debug".to_string(),
        xcodebuild: PathBuf::from("xcodebuild"),
        framework: FrameworkConfig::default(),
    }
}
