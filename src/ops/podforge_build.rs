//! Implementation of `podforge build` and `podforge sync`.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;

use crate::builder::events::EventSink;
use crate::builder::executor::{BuildReport, Executor};
use crate::builder::graph::StepId;
use crate::builder::plan::{BuildPlan, Planner};
use crate::builder::BuildContext;
use crate::core::errors::ConfigError;
use crate::core::project::Project;
use crate::core::target::NativeTarget;
use crate::util::process::CommandRunner;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Limit compile, def and settings steps to these targets (empty = all)
    pub targets: Vec<String>,

    /// Also link and sync the framework of this target
    pub sync: Option<String>,

    /// Run only the sync step of `sync` and what it needs
    pub sync_only: bool,

    /// Number of parallel jobs (None = config, then rayon default)
    pub jobs: Option<usize>,

    /// Keep running independent steps after a failure
    pub keep_going: Option<bool>,

    /// Show a progress bar
    pub progress: bool,
}

/// Resolve a target name against the enabled targets.
pub fn resolve_target(enabled: &[NativeTarget], name: &str) -> Result<NativeTarget, ConfigError> {
    let unknown = || ConfigError::UnknownTarget {
        name: name.to_string(),
        available: enabled.iter().map(|t| t.name().to_string()).collect(),
    };
    let target: NativeTarget = name.parse().map_err(|_| unknown())?;
    if enabled.contains(&target) {
        Ok(target)
    } else {
        Err(unknown())
    }
}

/// Plan every enabled target of `project`.
///
/// Pods reach the planner through a registry subscription, so pods and
/// targets may arrive in any order before materialization.
pub fn plan(project: &Project) -> Result<(BuildContext, BuildPlan)> {
    let ctx = BuildContext::new(project);
    let planner = Arc::new(Planner::new(ctx.clone()));

    let mut registry = project.registry()?;
    let subscriber = Arc::clone(&planner);
    registry.subscribe(move |pod| {
        if let Err(e) = subscriber.add_pod(Arc::clone(pod)) {
            tracing::warn!("{}", e);
        }
    });

    for &target in &project.target_set().apple_targets {
        planner.add_target(target);
    }

    let plan = planner.materialize()?;
    Ok((ctx, plan))
}

/// Steps the options select, with everything they depend on.
pub fn select_steps(plan: &BuildPlan, opts: &BuildOptions) -> Result<HashSet<StepId>> {
    let targets = opts
        .targets
        .iter()
        .map(|name| resolve_target(plan.targets(), name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut roots = if opts.sync_only {
        Vec::new()
    } else {
        plan.default_roots(&targets)
    };

    if let Some(name) = &opts.sync {
        let target = resolve_target(plan.targets(), name)?;
        roots.push(plan.sync_step(target)?);
    }

    Ok(plan.select(&roots))
}

/// Plan, select and run.
///
/// Configuration problems surface before any process starts; step failures
/// come back as [`crate::builder::BuildError::StepsFailed`].
pub fn build(
    project: &Project,
    opts: &BuildOptions,
    runner: &dyn CommandRunner,
    sink: &dyn EventSink,
) -> Result<BuildReport> {
    let (ctx, plan) = plan(project)?;
    let selected = select_steps(&plan, opts)?;

    let compiles = selected
        .iter()
        .any(|&id| plan.graph().step(id).is_compile());
    if compiles {
        project.require_pods_project()?;
    }

    let settings = project.settings();
    let jobs = opts.jobs.or(settings.jobs).unwrap_or(0);
    let keep_going = opts.keep_going.unwrap_or(settings.keep_going);

    tracing::debug!(
        "running {} of {} step(s) with {} job(s)",
        selected.len(),
        plan.graph().len(),
        jobs
    );

    let report = Executor::new(&ctx, runner, sink)
        .jobs(jobs)
        .keep_going(keep_going)
        .progress(opts.progress)
        .execute(&plan, &selected)?;

    Ok(report.into_result()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::errors::BuildError;
    use crate::builder::events::NullSink;
    use crate::builder::executor::CompileStepResult;
    use crate::core::manifest::Manifest;
    use crate::test_support::{MockProcessOutput, MockRunner};
    use crate::util::config::Config;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[project]
name = "mpp-library"

[targets]
include-simulator = true

[cocoapods]
project = "ios-app/Pods/Pods.xcodeproj"

[[cocoapods.pod]]
name = "AFNetworking"

[[cocoapods.pod]]
scheme = "moko-widgets-flat"
module = "mokoWidgetsFlat"
"#;

    fn project(root: &Path, manifest: &str) -> Project {
        fs::create_dir_all(root.join("ios-app/Pods/Pods.xcodeproj")).unwrap();
        let manifest = Manifest::parse(manifest, &root.join("Podforge.toml")).unwrap();
        Project::from_manifest(manifest, Config::default())
    }

    #[test]
    fn test_plan_dedups_compile_steps() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path(), MANIFEST);

        let (_, plan) = plan(&project).unwrap();
        // 2 pods x 3 (sdk, arch) pairs
        assert_eq!(plan.compile_count(), 6);
        assert_eq!(plan.targets().len(), 3);
    }

    #[test]
    fn test_build_all_targets() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path(), MANIFEST);
        let runner = MockRunner::new().create_frameworks();

        let report = build(&project, &BuildOptions::default(), &runner, &NullSink).unwrap();

        assert!(report.success());
        assert_eq!(runner.calls().len(), 6);
        let results: Vec<&CompileStepResult> = report.compile_results().map(|(_, r)| r).collect();
        assert!(results.iter().all(|r| r.status.success()));
        assert!(tmp
            .path()
            .join("build/cocoapods/def/iosSimulatorArm64/mokoWidgetsFlat.def")
            .is_file());
    }

    #[test]
    fn test_build_selected_target() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path(), MANIFEST);
        let runner = MockRunner::new();
        let opts = BuildOptions {
            targets: vec!["iosX64".to_string()],
            ..Default::default()
        };

        build(&project, &opts, &runner, &NullSink).unwrap();

        let lines = runner.call_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains("-sdk iphonesimulator -arch x86_64")));
    }

    #[test]
    fn test_unknown_target() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path(), "[targets]\ninclude-simulator = false\n");
        let (_, plan) = plan(&project).unwrap();

        let opts = BuildOptions {
            targets: vec!["iosSimulatorArm64".to_string()],
            ..Default::default()
        };
        let err = select_steps(&plan, &opts).unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::UnknownTarget { name, available }) => {
                assert_eq!(name, "iosSimulatorArm64");
                assert_eq!(available, &vec!["iosArm64".to_string(), "iosX64".to_string()]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_sync_only_selection() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path(), MANIFEST);
        let (_, plan) = plan(&project).unwrap();

        let opts = BuildOptions {
            sync: Some("iosArm64".to_string()),
            sync_only: true,
            ..Default::default()
        };
        let selected = select_steps(&plan, &opts).unwrap();
        let mut names: Vec<_> = selected
            .iter()
            .map(|&id| plan.graph().step(id).name.clone())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "cocoapodBuildAFNetworkingIphoneosArm64",
                "cocoapodBuildMokoWidgetsFlatIphoneosArm64",
                "syncDebugFrameworkIosArm64",
            ]
        );
    }

    #[test]
    fn test_missing_pods_project_fails_before_running() {
        let tmp = TempDir::new().unwrap();
        let manifest = Manifest::parse(MANIFEST, &tmp.path().join("Podforge.toml")).unwrap();
        let project = Project::from_manifest(manifest, Config::default());
        let runner = MockRunner::new();

        let err = build(&project, &BuildOptions::default(), &runner, &NullSink).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::PodsProjectMissing { .. })
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_failed_build_returns_steps_failed() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path(), MANIFEST);
        let runner = MockRunner::new().expect_contains(
            "-scheme moko-widgets-flat",
            MockProcessOutput::failure(65, "error: no such module"),
        );
        let opts = BuildOptions {
            keep_going: Some(true),
            ..Default::default()
        };

        let err = build(&project, &opts, &runner, &NullSink).unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::StepsFailed { failed, .. }) => assert_eq!(*failed, 3),
            other => panic!("unexpected error {:?}", other),
        }
        // AFNetworking still compiled for every pair.
        assert_eq!(runner.calls().len(), 6);
    }
}
