//! Environment and project health checks.
//!
//! The `doctor` command verifies that everything a build needs is in place
//! before any pod is compiled.
//!
//! ## Checks Performed
//!
//! - Manifest and pod declarations
//! - `xcodebuild` availability and version
//! - Pods project location
//! - Products root for precompiled pods (optional)

use std::collections::HashMap;
use std::fmt::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::core::project::Project;
use crate::util::config::Config;
use crate::util::context::GlobalContext;
use crate::util::diagnostic::suggestions;
use crate::util::process::{find_executable, ProcessBuilder};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// Human-readable status message
    pub message: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub duration: Duration,
    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..CheckResult::pass(name, message)
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub checks: Vec<CheckResult>,
    pub total_duration: Duration,
    pub environment: HashMap<String, String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Configuration layered over the project's (CLI flags)
    pub overrides: Config,
}

/// Run the doctor command.
pub fn doctor(ctx: &GlobalContext, options: DoctorOptions) -> Result<DoctorReport> {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());

    match Project::load(ctx, options.overrides.clone()) {
        Ok(project) => {
            report.add(check_manifest(&project));
            report.add(check_xcodebuild(&project.settings().xcodebuild));
            report.add(check_pods_project(&project));
            if let Some(check) = check_products_root(&project) {
                report.add(check);
            }
        }
        Err(e) => {
            report.add(CheckResult::fail("Manifest", format!("{:#}", e)));
            let xcodebuild = options
                .overrides
                .cocoapods
                .xcodebuild
                .clone()
                .unwrap_or_else(|| PathBuf::from(crate::core::project::DEFAULT_XCODEBUILD));
            report.add(check_xcodebuild(&xcodebuild));
        }
    }

    report.total_duration = start.elapsed();
    Ok(report)
}

fn check_manifest(project: &Project) -> CheckResult {
    let start = Instant::now();
    let path = project.root().join(crate::core::manifest::MANIFEST_NAME);

    match project.registry() {
        Ok(registry) => CheckResult::pass(
            "Manifest",
            format!("{} pod(s) declared in {}", registry.len(), project.name()),
        )
        .with_path(path),
        Err(e) => CheckResult::fail("Manifest", format!("{:#}", e)).with_path(path),
    }
    .with_duration(start.elapsed())
}

/// Check that xcodebuild can be found and reports a version.
fn check_xcodebuild(program: &std::path::Path) -> CheckResult {
    let start = Instant::now();

    let path = if program.components().count() > 1 {
        Some(program.to_path_buf()).filter(|p| p.is_file())
    } else {
        find_executable(&program.to_string_lossy())
    };

    let Some(path) = path else {
        return CheckResult::fail(
            "xcodebuild",
            format!(
                "`{}` not found. {}",
                program.display(),
                suggestions::NO_XCODEBUILD
            ),
        )
        .with_duration(start.elapsed());
    };

    let version = ProcessBuilder::new(&path)
        .arg("-version")
        .exec()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .next()
                .unwrap_or("")
                .trim()
                .to_string()
        });

    let mut check = CheckResult::pass("xcodebuild", "xcodebuild is available").with_path(path);
    if let Some(version) = version {
        check = check.with_version(version);
    }
    check.with_duration(start.elapsed())
}

fn check_pods_project(project: &Project) -> CheckResult {
    let start = Instant::now();

    match project.require_pods_project() {
        Ok(path) => CheckResult::pass("Pods project", "pods project found")
            .with_path(path.to_path_buf()),
        Err(e) => CheckResult::fail("Pods project", e.to_string()),
    }
    .with_duration(start.elapsed())
}

/// Only relevant when a precompiled pod is declared.
fn check_products_root(project: &Project) -> Option<CheckResult> {
    let precompiled = project
        .manifest()
        .cocoapods
        .pods
        .iter()
        .any(|p| p.precompiled);
    if !precompiled {
        return None;
    }

    let check = match project.products_root() {
        Some(root) if root.is_dir() => {
            CheckResult::pass("Products root", "products root found").with_path(root)
        }
        Some(root) => CheckResult::fail("Products root", "products root does not exist")
            .with_path(root),
        None => CheckResult::fail("Products root", "precompiled pods need [cocoapods] products-root"),
    };
    Some(check.optional())
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Podforge Doctor");
    let _ = writeln!(output, "===============\n");

    if verbose {
        let unknown = "unknown".to_string();
        let _ = writeln!(output, "Environment:");
        let _ = writeln!(
            output,
            "  OS: {} ({})",
            report.environment.get("os").unwrap_or(&unknown),
            report.environment.get("arch").unwrap_or(&unknown)
        );
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        let _ = writeln!(output, "  {} {}{}", status, check.name, required);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
            if let Some(version) = &check.version {
                let _ = writeln!(output, "      Version: {}", version);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Summary: {} passed, {} failed",
        report.passed_count(),
        report.failed_count()
    );

    let required_failed = report.required_failed_count();
    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\nWarning: {} required check(s) failed. Builds will not work.",
            required_failed
        );
    }

    output
}
