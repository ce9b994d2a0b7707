//! The `[framework]` manifest section: the framework the host build links
//! and the artifacts it re-exports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builder::errors::BuildError;
use crate::core::target::{capitalize, Arch, NativeTarget};

pub const DEFAULT_FRAMEWORK_NAME: &str = "MultiPlatformLibrary";
pub const DEFAULT_OUTPUT_DIR: &str = "build/bin/{target}/{configuration}Framework";

/// Framework produced by the host build for every Apple target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FrameworkConfig {
    pub name: String,
    pub exports: Vec<Export>,
    /// Where the host build leaves the linked framework, relative to the
    /// project root
    pub output_dir: String,
    pub link: Option<LinkCommand>,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        FrameworkConfig {
            name: DEFAULT_FRAMEWORK_NAME.to_string(),
            exports: Vec::new(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            link: None,
        }
    }
}

impl FrameworkConfig {
    /// Exports for one architecture, in declaration order.
    pub fn exports_for(&self, arch: Arch) -> Result<Vec<String>, BuildError> {
        self.exports
            .iter()
            .map(|e| e.for_arch(arch).map(str::to_string))
            .collect()
    }

    /// The framework output directory for `target`, relative to the project
    /// root.
    pub fn output_dir_for(&self, target: NativeTarget, configuration: &str) -> String {
        expand_placeholders(&self.output_dir, target, configuration)
    }
}

/// An artifact re-exported from the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Export {
    /// The same artifact for every architecture.
    Artifact(String),
    /// A different artifact per architecture.
    PerArch {
        arm64: Option<String>,
        x64: Option<String>,
    },
}

impl Export {
    pub fn for_arch(&self, arch: Arch) -> Result<&str, BuildError> {
        let found = match (self, arch) {
            (Export::Artifact(artifact), _) => Some(artifact.as_str()),
            (Export::PerArch { arm64, .. }, Arch::Arm64) => arm64.as_deref(),
            (Export::PerArch { x64, .. }, Arch::X86_64) => x64.as_deref(),
        };
        found.ok_or_else(|| BuildError::UnsupportedArchitecture {
            export: self.to_string(),
            arch: arch.to_string(),
        })
    }
}

impl fmt::Display for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Artifact(artifact) => f.write_str(artifact),
            Export::PerArch { arm64, x64 } => write!(
                f,
                "{{ arm64 = {}, x64 = {} }}",
                arm64.as_deref().unwrap_or("-"),
                x64.as_deref().unwrap_or("-")
            ),
        }
    }
}

/// Host command that links the framework for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl LinkCommand {
    /// Arguments with placeholders expanded for `target`.
    pub fn args_for(&self, target: NativeTarget, configuration: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| expand_placeholders(a, target, configuration))
            .collect()
    }
}

/// Expand `{target}`, `{Target}`, `{configuration}` and `{Configuration}`.
pub fn expand_placeholders(template: &str, target: NativeTarget, configuration: &str) -> String {
    template
        .replace("{target}", target.name())
        .replace("{Target}", &capitalize(target.name()))
        .replace("{configuration}", &configuration.to_lowercase())
        .replace("{Configuration}", &capitalize(&configuration.to_lowercase()))
}
