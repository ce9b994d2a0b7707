//! Build planning and execution errors.

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised while constructing or executing build steps.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unsupported sdk/architecture combination: {sdk}/{arch}")]
    UnsupportedTarget { sdk: String, arch: String },

    #[error("export `{export}` has no variant for architecture {arch}")]
    UnsupportedArchitecture { export: String, arch: String },

    #[error("step `{name}` is already defined differently")]
    DuplicateStep { name: String },

    #[error("pod `{module}` added after the plan was materialized")]
    PlanFrozen { module: String },

    #[error("cycle detected in build graph")]
    CycleDetected { steps: Vec<String> },

    #[error("`{step}` failed: {program} exited with {}", display_code(*.code))]
    ToolchainFailed {
        step: String,
        program: String,
        code: Option<i32>,
    },

    #[error("unknown step `{name}`")]
    UnknownStep { name: String, available: Vec<String> },

    #[error("{failed} step(s) failed")]
    StepsFailed { failed: usize, steps: Vec<String> },
}

fn display_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

impl BuildError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BuildError::UnsupportedTarget { sdk, arch } => {
                Diagnostic::error(format!("pods cannot be compiled for {}/{}", sdk, arch))
                    .with_context("supported: iphoneos/arm64, iphonesimulator/x86_64, iphonesimulator/arm64")
                    .with_suggestion("Remove the target from the build or mark the pod as precompiled")
            }

            BuildError::UnsupportedArchitecture { export, arch } => {
                Diagnostic::error(format!("export `{}` has no {} variant", export, arch))
                    .with_suggestion("Add the missing architecture to the export table in [framework]")
            }

            BuildError::DuplicateStep { name } => Diagnostic::error(self.to_string())
                .with_context(format!(
                    "two pods or targets map to the step name `{}`",
                    name
                ))
                .with_suggestion("Give the clashing pods distinct `module` names"),

            BuildError::PlanFrozen { .. } => Diagnostic::error(self.to_string())
                .with_context("pods are fixed once their steps are wired")
                .with_suggestion("Declare every pod before planning the build"),

            BuildError::CycleDetected { steps } => Diagnostic::error("cycle detected in build graph")
                .with_context(format!("cycle: {}", steps.join(" -> ")))
                .with_suggestion("Break the cycle between the listed steps"),

            BuildError::ToolchainFailed { step, program, code } => {
                Diagnostic::error(format!("`{}` failed", step))
                    .with_context(format!("{} exited with {}", program, display_code(*code)))
                    .with_suggestion(suggestions::BUILD_FAILED)
                    .with_suggestion("Fix the pods project or toolchain, then re-run the build")
            }

            BuildError::UnknownStep { name, available } => {
                let mut diag = Diagnostic::error(format!("unknown step `{}`", name));
                if !available.is_empty() {
                    diag = diag.with_context(format!("available steps: {}", available.join(", ")));
                }
                diag.with_suggestion("Run `podforge build --plan` to list every step")
            }

            BuildError::StepsFailed { steps, .. } => {
                let mut diag = Diagnostic::error(self.to_string());
                for step in steps {
                    diag = diag.with_context(step.clone());
                }
                diag
            }
        }
    }
}
