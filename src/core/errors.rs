//! Configuration errors.
//!
//! Everything here is raised while reading the manifest and declaring pods,
//! before any external process is started.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigError {
    #[error("invalid pod module name `{name}`")]
    #[diagnostic(
        code(podforge::config::invalid_module),
        help("Module names must match [A-Za-z_][A-Za-z0-9_]*; set `module` explicitly for schemes with dashes")
    )]
    InvalidModuleName { name: String },

    #[error("pod module `{name}` clashes with declared module `{existing}`")]
    #[diagnostic(
        code(podforge::config::module_name_clash),
        help("Module names that differ only by case produce the same step names")
    )]
    ModuleNameClash { name: String, existing: String },

    #[error("precompiled pod `{module}` declared but no products root is set")]
    #[diagnostic(
        code(podforge::config::products_root_unset),
        help("Set [cocoapods] products-root in Podforge.toml")
    )]
    ProductsRootUnset { module: String },

    #[error("pods project is not configured")]
    #[diagnostic(
        code(podforge::config::pods_project_unset),
        help("Set [cocoapods] project in Podforge.toml or export PODFORGE_PODS_PROJECT")
    )]
    PodsProjectUnset,

    #[error("pods project not found: {}", path.display())]
    #[diagnostic(
        code(podforge::config::pods_project_missing),
        help("Run `pod install` in the iOS app directory first")
    )]
    PodsProjectMissing { path: PathBuf },

    #[error("could not find Podforge.toml in {} or any parent directory", dir.display())]
    #[diagnostic(code(podforge::config::manifest_not_found))]
    ManifestNotFound { dir: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    #[diagnostic(code(podforge::config::manifest_parse))]
    ManifestParse { path: PathBuf, message: String },

    #[error("unknown target `{name}`")]
    #[diagnostic(
        code(podforge::config::unknown_target),
        help("Run `podforge targets` to see enabled targets")
    )]
    UnknownTarget { name: String, available: Vec<String> },

    #[error("unknown pod `{module}`")]
    #[diagnostic(code(podforge::config::unknown_pod))]
    UnknownPod { module: String, available: Vec<String> },
}

impl ConfigError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ConfigError::InvalidModuleName { name } => diag
                .with_context("module names become Objective-C module and framework names")
                .with_suggestion(format!(
                    "Use `module = \"{}\"` next to `scheme = \"{}\"`",
                    sanitize_module(name),
                    name
                )),

            ConfigError::ModuleNameClash { existing, .. } => diag
                .with_context("step and framework names are derived from the capitalized module name")
                .with_suggestion(format!(
                    "Give one of the pods an explicit `module` distinct from `{}`",
                    existing
                )),

            ConfigError::ProductsRootUnset { .. } => diag
                .with_context("precompiled pods are looked up below the products root")
                .with_suggestion("Add `products-root = \"prebuilt\"` under [cocoapods]"),

            ConfigError::PodsProjectUnset => diag.with_suggestion(suggestions::NO_PODS_PROJECT),

            ConfigError::PodsProjectMissing { path } => diag
                .with_location(path.clone())
                .with_suggestion("Run `pod install` in the iOS app directory"),

            ConfigError::ManifestNotFound { .. } => diag.with_suggestion(suggestions::NO_MANIFEST),

            ConfigError::ManifestParse { path, .. } => diag.with_location(path.clone()),

            ConfigError::UnknownTarget { available, .. } => diag
                .with_context(format!("enabled targets: {}", available.join(", ")))
                .with_suggestion(suggestions::TARGET_NOT_FOUND),

            ConfigError::UnknownPod { available, .. } => {
                if available.is_empty() {
                    diag.with_context("no pods are declared in Podforge.toml")
                } else {
                    diag.with_context(format!("declared pods: {}", available.join(", ")))
                }
            }
        }
    }
}

fn sanitize_module(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
