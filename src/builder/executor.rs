//! Build executor with progress reporting.
//!
//! Runs a selection of the step graph in waves. A wave holds every step
//! whose prerequisites all succeeded; its steps run in parallel on a rayon
//! pool. A failed step fails its dependents without running them.
//!
//! Compile steps for the same (sdk, arch) share a SYMROOT, so they run one
//! at a time even when they land in the same wave.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::events::{BuildEvent, EventSink, StepStatus};
use crate::builder::graph::{Step, StepId, StepKind};
use crate::builder::plan::BuildPlan;
use crate::builder::sync::sync_dir;
use crate::builder::xcodebuild;
use crate::util::process::{CommandRunner, OutputStream, ProcessBuilder, ProcessStatus};

/// What a compile step left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileStepResult {
    pub frameworks_dir: PathBuf,
    pub status: ProcessStatus,
}

/// Final state of one selected step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub name: String,
    pub kind: &'static str,
    pub status: StepStatus,
    pub duration: Option<Duration>,
    pub message: Option<String>,
    pub compile: Option<CompileStepResult>,
}

impl StepOutcome {
    fn skipped(step: &Step, status: StepStatus, message: Option<String>) -> Self {
        StepOutcome {
            name: step.name.clone(),
            kind: step.kind_name(),
            status,
            duration: None,
            message,
            compile: None,
        }
    }
}

/// Result of running a selection.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Outcomes in execution order
    pub steps: Vec<StepOutcome>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn success(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Succeeded)
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    pub fn outcome(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Compile results by step name.
    pub fn compile_results(&self) -> impl Iterator<Item = (&str, &CompileStepResult)> {
        self.steps
            .iter()
            .filter_map(|s| s.compile.as_ref().map(|c| (s.name.as_str(), c)))
    }

    /// Turn a failed build into [`BuildError::StepsFailed`].
    pub fn into_result(self) -> Result<BuildReport, BuildError> {
        let failed: Vec<String> = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .map(|s| match &s.message {
                Some(message) => format!("{}: {}", s.name, message),
                None => s.name.clone(),
            })
            .collect();

        if failed.is_empty() && self.success() {
            return Ok(self);
        }

        Err(BuildError::StepsFailed {
            failed: failed.len(),
            steps: failed,
        })
    }
}

/// Runs selected plan steps.
pub struct Executor<'a> {
    ctx: &'a BuildContext,
    runner: &'a dyn CommandRunner,
    sink: &'a dyn EventSink,
    jobs: usize,
    keep_going: bool,
    progress: bool,
    symroot_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl<'a> Executor<'a> {
    pub fn new(ctx: &'a BuildContext, runner: &'a dyn CommandRunner, sink: &'a dyn EventSink) -> Self {
        Executor {
            ctx,
            runner,
            sink,
            jobs: 0,
            keep_going: false,
            progress: false,
            symroot_locks: Mutex::default(),
        }
    }

    /// Parallel jobs; 0 lets rayon decide.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Keep starting independent steps after a failure.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Show a progress bar on stderr.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Run the `selected` steps of `plan`.
    ///
    /// Step failures are reported in the returned [`BuildReport`]; an `Err`
    /// means the build could not be attempted at all.
    pub fn execute(&self, plan: &BuildPlan, selected: &HashSet<StepId>) -> Result<BuildReport> {
        let start = Instant::now();
        let graph = plan.graph();
        let order: Vec<StepId> = graph
            .topological_order()?
            .into_iter()
            .filter(|id| selected.contains(id))
            .collect();

        self.sink.emit(&BuildEvent::started(
            &self.ctx.project_name,
            plan.configuration(),
            order.len(),
        ));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .context("failed to create build thread pool")?;

        let pb = if self.progress && order.len() > 1 {
            let pb = ProgressBar::new(order.len() as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        let halted = AtomicBool::new(false);
        let mut outcomes: HashMap<StepId, StepOutcome> = HashMap::new();

        loop {
            if halted.load(Ordering::SeqCst) && !self.keep_going {
                break;
            }

            let ready: Vec<StepId> = order
                .iter()
                .copied()
                .filter(|id| !outcomes.contains_key(id))
                .filter(|&id| {
                    graph
                        .prerequisites(id)
                        .iter()
                        .filter(|p| selected.contains(*p))
                        .all(|p| {
                            outcomes
                                .get(p)
                                .is_some_and(|o| o.status == StepStatus::Succeeded)
                        })
                })
                .collect();

            if ready.is_empty() {
                break;
            }

            let results: Vec<(StepId, Option<StepOutcome>)> = pool.install(|| {
                ready
                    .par_iter()
                    .map(|&id| (id, self.run_one(graph.step(id), &halted, pb.as_ref())))
                    .collect()
            });

            for (id, outcome) in results {
                let Some(outcome) = outcome else { continue };
                let failed = outcome.status == StepStatus::Failed;
                let name = outcome.name.clone();
                outcomes.insert(id, outcome);

                if !failed {
                    continue;
                }
                let mut dependents: Vec<StepId> = graph
                    .transitive_dependents(id)
                    .into_iter()
                    .filter(|d| selected.contains(d) && !outcomes.contains_key(d))
                    .collect();
                dependents.sort();
                for dep in dependents {
                    let step = graph.step(dep);
                    let message = format!("prerequisite `{}` failed", name);
                    tracing::debug!("{} not run: {}", step.name, message);
                    self.sink.emit(&BuildEvent::step_finished(
                        &step.name,
                        StepStatus::UpstreamFailed,
                        None,
                        Some(message.clone()),
                    ));
                    if let Some(pb) = &pb {
                        pb.inc(1);
                    }
                    outcomes.insert(
                        dep,
                        StepOutcome::skipped(step, StepStatus::UpstreamFailed, Some(message)),
                    );
                }
            }
        }

        let mut steps = Vec::with_capacity(order.len());
        for id in order {
            let outcome = match outcomes.remove(&id) {
                Some(outcome) => outcome,
                None => {
                    let step = graph.step(id);
                    self.sink.emit(&BuildEvent::step_finished(
                        &step.name,
                        StepStatus::NotRun,
                        None,
                        None,
                    ));
                    StepOutcome::skipped(step, StepStatus::NotRun, None)
                }
            };
            steps.push(outcome);
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let report = BuildReport {
            steps,
            duration: start.elapsed(),
        };

        self.sink.emit(&BuildEvent::BuildFinished {
            success: report.success(),
            duration_ms: report.duration.as_millis() as u64,
            succeeded: report.count(StepStatus::Succeeded),
            failed: report.count(StepStatus::Failed) + report.count(StepStatus::UpstreamFailed),
            not_run: report.count(StepStatus::NotRun),
        });

        Ok(report)
    }

    /// Run one step unless the build has halted.
    fn run_one(&self, step: &Step, halted: &AtomicBool, pb: Option<&ProgressBar>) -> Option<StepOutcome> {
        if !self.keep_going && halted.load(Ordering::SeqCst) {
            return None;
        }

        self.sink
            .emit(&BuildEvent::step_started(&step.name, step.kind_name()));
        if let Some(pb) = pb {
            pb.set_message(step.name.clone());
        }
        tracing::debug!("running {}", step.name);

        let started = Instant::now();
        let mut compile = None;
        let result = self.run_step(step, &mut compile);
        let duration = started.elapsed();

        let (status, message) = match result {
            Ok(()) => (StepStatus::Succeeded, None),
            Err(e) => {
                halted.store(true, Ordering::SeqCst);
                tracing::error!("{}: {:#}", step.name, e);
                (StepStatus::Failed, Some(format!("{:#}", e)))
            }
        };

        self.sink.emit(&BuildEvent::step_finished(
            &step.name,
            status,
            Some(duration.as_millis() as u64),
            message.clone(),
        ));
        if let Some(pb) = pb {
            pb.inc(1);
        }

        Some(StepOutcome {
            name: step.name.clone(),
            kind: step.kind_name(),
            status,
            duration: Some(duration),
            message,
            compile,
        })
    }

    fn run_step(&self, step: &Step, compile: &mut Option<CompileStepResult>) -> Result<()> {
        match &step.kind {
            StepKind::CompilePod {
                key,
                scheme,
                frameworks_dir,
            } => {
                let cmd = xcodebuild::compile_command(self.ctx, scheme, key)?;
                let symroot = self.symroot_lock(self.ctx.symroot(key.sdk, key.arch));
                let _guard = symroot.lock().unwrap_or_else(|e| e.into_inner());
                tracing::info!("compiling {}", key);
                let status = self.run_tool(step, &cmd, Tool::Xcodebuild)?;
                *compile = Some(CompileStepResult {
                    frameworks_dir: frameworks_dir.clone(),
                    status,
                });
                check_status(step, &cmd, status)
            }

            StepKind::GenerateDef {
                interop, def_file, ..
            } => {
                interop.write(def_file)?;
                tracing::debug!("wrote {}", self.ctx.display_path(def_file));
                Ok(())
            }

            StepKind::WriteSettings { settings, path } => {
                settings.write(path)?;
                tracing::debug!("wrote {}", self.ctx.display_path(path));
                Ok(())
            }

            StepKind::Link {
                target,
                program,
                args,
            } => {
                let cmd = ProcessBuilder::new(resolve_program(&self.ctx.project_root, program))
                    .args(args)
                    .cwd(&self.ctx.project_root);
                tracing::info!("linking framework for {}", target);
                let status = self.run_tool(step, &cmd, Tool::Link)?;
                check_status(step, &cmd, status)
            }

            StepKind::SyncFramework { target, src, dest } => {
                sync_dir(src, dest)?;
                tracing::info!(
                    "synced {} framework to {}",
                    target,
                    self.ctx.display_path(dest)
                );
                Ok(())
            }
        }
    }

    fn symroot_lock(&self, symroot: PathBuf) -> Arc<Mutex<()>> {
        let mut locks = self.symroot_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(symroot).or_default())
    }

    /// Run an external tool, streaming its output to the log and the sink.
    fn run_tool(&self, step: &Step, cmd: &ProcessBuilder, tool: Tool) -> Result<ProcessStatus> {
        tracing::debug!("running `{}`", cmd.display_command());

        let on_line = |stream: OutputStream, line: &str| {
            match (tool, stream) {
                (Tool::Xcodebuild, OutputStream::Stdout) => {
                    tracing::info!(target: "podforge::xcodebuild", "{}", line)
                }
                (Tool::Xcodebuild, OutputStream::Stderr) => {
                    tracing::error!(target: "podforge::xcodebuild", "{}", line)
                }
                (Tool::Link, OutputStream::Stdout) => {
                    tracing::info!(target: "podforge::link", "{}", line)
                }
                (Tool::Link, OutputStream::Stderr) => {
                    tracing::error!(target: "podforge::link", "{}", line)
                }
            }
            self.sink.emit(&BuildEvent::output(&step.name, stream, line));
        };

        self.runner.run_streaming(cmd, &on_line)
    }
}

#[derive(Debug, Clone, Copy)]
enum Tool {
    Xcodebuild,
    Link,
}

fn check_status(step: &Step, cmd: &ProcessBuilder, status: ProcessStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(BuildError::ToolchainFailed {
        step: step.name.clone(),
        program: cmd.get_program().display().to_string(),
        code: status.code,
    }
    .into())
}

/// Programs given as a relative path (`./gradlew`) are relative to the
/// project root; bare names are looked up on PATH.
fn resolve_program(root: &Path, program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        root.join(path)
    } else {
        path.to_path_buf()
    }
}
