//! Build plan generation.
//!
//! Planning happens in two phases. Pods and targets are first collected in
//! any order with [`Planner::add_pod`] and [`Planner::add_target`]. Then
//! [`Planner::materialize`] wires every (target, pod) pair into the step
//! graph, creating at most one compile step per (module, sdk, arch).
//!
//! Pods are fixed once the plan is materialized. Targets added later are
//! wired by the next `materialize`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use serde::Serialize;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::graph::{Step, StepGraph, StepId, StepKind};
use crate::builder::interop::InteropDescriptor;
use crate::builder::settings::TargetSettings;
use crate::core::pod::PodDescriptor;
use crate::core::target::{capitalize, Arch, CompileStepKey, NativeTarget, Sdk};

/// Where a (pod, target) pair is in planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairState {
    /// Only one side of the pair is known
    Declared,
    /// Both sides are known, wiring has not run yet
    AwaitingBothSidesKnown,
    /// The pair's steps are in the graph
    Scheduled,
}

/// The compile step for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileStepHandle {
    pub id: StepId,
    pub frameworks_dir: PathBuf,
}

/// Collects pods and targets, then produces a [`BuildPlan`].
pub struct Planner {
    ctx: BuildContext,
    state: Mutex<PlannerState>,
}

#[derive(Default)]
struct PlannerState {
    graph: StepGraph,
    compile_steps: HashMap<CompileStepKey, StepId>,
    pods: Vec<Arc<PodDescriptor>>,
    targets: Vec<NativeTarget>,
    /// (module, target) pairs whose steps are in the graph
    wired: HashSet<(String, NativeTarget)>,
    materialized: bool,
}

impl Planner {
    pub fn new(ctx: BuildContext) -> Self {
        Planner {
            ctx,
            state: Mutex::new(PlannerState::default()),
        }
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    fn lock(&self) -> MutexGuard<'_, PlannerState> {
        // Poisoning leaves the graph consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a pod. A pod with the same module replaces the earlier one.
    ///
    /// Fails once the plan has been materialized.
    pub fn add_pod(&self, pod: Arc<PodDescriptor>) -> Result<(), BuildError> {
        let mut state = self.lock();
        if state.materialized {
            return Err(BuildError::PlanFrozen {
                module: pod.module().to_string(),
            });
        }
        match state.pods.iter_mut().find(|p| p.module() == pod.module()) {
            Some(existing) => *existing = pod,
            None => state.pods.push(pod),
        }
        Ok(())
    }

    /// Record an Apple target.
    pub fn add_target(&self, target: NativeTarget) {
        let mut state = self.lock();
        if !state.targets.contains(&target) {
            state.targets.push(target);
        }
    }

    /// Planning state of the (`module`, `target`) pair, or `None` when
    /// neither side is known.
    pub fn state(&self, module: &str, target: NativeTarget) -> Option<PairState> {
        let state = self.lock();
        let has_pod = state.pods.iter().any(|p| p.module() == module);
        let has_target = state.targets.contains(&target);

        match (has_pod, has_target) {
            (false, false) => None,
            (true, true) if state.wired.contains(&(module.to_string(), target)) => {
                Some(PairState::Scheduled)
            }
            (true, true) => Some(PairState::AwaitingBothSidesKnown),
            _ => Some(PairState::Declared),
        }
    }

    /// Return the compile step for `pod` on (`sdk`, `arch`), creating it on
    /// first use.
    pub fn ensure_compile_step(
        &self,
        pod: &PodDescriptor,
        sdk: Sdk,
        arch: Arch,
    ) -> Result<CompileStepHandle, BuildError> {
        let mut state = self.lock();
        state.ensure_compile_step(&self.ctx, pod, sdk, arch)
    }

    /// Number of compile steps created so far.
    pub fn compile_step_count(&self) -> usize {
        self.lock().compile_steps.len()
    }

    /// Wire every (target, pod) pair and validate the graph.
    ///
    /// Wiring is idempotent: materializing twice yields the same plan.
    pub fn materialize(&self) -> Result<BuildPlan> {
        let mut state = self.lock();
        let targets = state.targets.clone();
        let pods = state.pods.clone();

        for &target in &targets {
            state.wire_target(&self.ctx, target, &pods)?;
        }

        state.graph.validate()?;
        state.materialized = true;

        tracing::debug!(
            "planned {} step(s), {} compile step(s) for {} target(s)",
            state.graph.len(),
            state.compile_steps.len(),
            targets.len()
        );

        Ok(BuildPlan {
            graph: state.graph.clone(),
            targets,
            configuration: self.ctx.configuration.clone(),
        })
    }
}

impl PlannerState {
    fn ensure_compile_step(
        &mut self,
        ctx: &BuildContext,
        pod: &PodDescriptor,
        sdk: Sdk,
        arch: Arch,
    ) -> Result<CompileStepHandle, BuildError> {
        let key = CompileStepKey::new(pod.module(), sdk, arch)?;
        let frameworks_dir = ctx.frameworks_dir(sdk, arch);

        if let Some(&id) = self.compile_steps.get(&key) {
            return Ok(CompileStepHandle { id, frameworks_dir });
        }

        let step = Step::new(
            key.step_name(),
            StepKind::CompilePod {
                key: key.clone(),
                scheme: pod.scheme().to_string(),
                frameworks_dir: frameworks_dir.clone(),
            },
        );
        let id = self.graph.add_step(step)?;
        tracing::debug!("added compile step for {}", key);
        self.compile_steps.insert(key, id);

        Ok(CompileStepHandle { id, frameworks_dir })
    }

    fn wire_target(
        &mut self,
        ctx: &BuildContext,
        target: NativeTarget,
        pods: &[Arc<PodDescriptor>],
    ) -> Result<()> {
        let (sdk, arch) = target.pod_sdk_arch()?;
        let mut compiles = Vec::new();
        let mut defs = Vec::new();
        let mut interops = Vec::new();

        for pod in pods {
            let (search_paths, compile) = if pod.needs_compile() {
                let handle = self.ensure_compile_step(ctx, pod, sdk, arch)?;
                compiles.push(handle.id);
                (vec![handle.frameworks_dir], Some(handle.id))
            } else {
                (pod.precompiled_search_paths(arch), None)
            };

            if !pod.has_interop() {
                continue;
            }

            let interop = InteropDescriptor::new(pod, target, search_paths);
            let compile_key = compile.map(|_| CompileStepKey {
                module: pod.module().to_string(),
                sdk,
                arch,
            });
            let def = self.graph.add_step(Step::new(
                format!(
                    "generateDefCocoapod{}{}",
                    capitalize(pod.module()),
                    capitalize(target.name())
                ),
                StepKind::GenerateDef {
                    interop: interop.clone(),
                    def_file: ctx.def_file(target, pod.module()),
                    compile_key,
                },
            ))?;
            if let Some(compile) = compile {
                self.graph.add_edge(compile, def);
            }
            defs.push(def);
            interops.push(interop);
        }

        let pod_refs: Vec<&PodDescriptor> = pods.iter().map(|p| p.as_ref()).collect();
        let settings = TargetSettings::new(ctx, target, &pod_refs, &interops)?;
        let settings_id = self.graph.add_step(Step::new(
            settings_step_name(target),
            StepKind::WriteSettings {
                settings,
                path: ctx.settings_file(target),
            },
        ))?;
        for &id in compiles.iter().chain(&defs) {
            self.graph.add_edge(id, settings_id);
        }

        let link_id = match &ctx.framework.link {
            Some(link) => {
                let id = self.graph.add_step(Step::new(
                    link_step_name(target, &ctx.configuration),
                    StepKind::Link {
                        target,
                        program: link.program.clone(),
                        args: link.args_for(target, &ctx.configuration),
                    },
                ))?;
                self.graph.add_edge(settings_id, id);
                for &def in &defs {
                    self.graph.add_edge(def, id);
                }
                Some(id)
            }
            None => None,
        };

        let sync_id = self.graph.add_step(Step::new(
            sync_step_name(target, &ctx.configuration),
            StepKind::SyncFramework {
                target,
                src: ctx.framework_output_dir(target),
                dest: ctx.sync_dest(),
            },
        ))?;
        for &id in compiles.iter().chain(link_id.iter()) {
            self.graph.add_edge(id, sync_id);
        }

        self.wired
            .extend(pods.iter().map(|p| (p.module().to_string(), target)));

        Ok(())
    }
}

/// `cocoapodSettingsIosArm64`
pub fn settings_step_name(target: NativeTarget) -> String {
    format!("cocoapodSettings{}", capitalize(target.name()))
}

/// `linkDebugFrameworkIosArm64`
pub fn link_step_name(target: NativeTarget, configuration: &str) -> String {
    format!(
        "link{}Framework{}",
        capitalize(&configuration.to_lowercase()),
        capitalize(target.name())
    )
}

/// The sync step is named after the link step it follows.
pub fn sync_step_name(target: NativeTarget, configuration: &str) -> String {
    link_step_name(target, configuration).replacen("link", "sync", 1)
}

/// A validated step graph plus the targets it was planned for.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    graph: StepGraph,
    targets: Vec<NativeTarget>,
    configuration: String,
}

#[derive(Serialize)]
struct PlannedStep<'a> {
    #[serde(flatten)]
    step: &'a Step,
    depends_on: Vec<&'a str>,
}

impl BuildPlan {
    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    pub fn targets(&self) -> &[NativeTarget] {
        &self.targets
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn compile_count(&self) -> usize {
        self.graph
            .ids()
            .filter(|&id| self.graph.step(id).is_compile())
            .count()
    }

    /// Compile, def and settings steps, optionally limited to `targets`.
    ///
    /// Link and sync steps are left out; they are selected per target with
    /// [`BuildPlan::sync_step`].
    pub fn default_roots(&self, targets: &[NativeTarget]) -> Vec<StepId> {
        self.graph
            .ids()
            .filter(|&id| {
                let step = self.graph.step(id);
                let kind_selected = matches!(
                    step.kind,
                    StepKind::CompilePod { .. }
                        | StepKind::GenerateDef { .. }
                        | StepKind::WriteSettings { .. }
                );
                kind_selected
                    && (targets.is_empty() || targets.iter().any(|&t| step.applies_to(t)))
            })
            .collect()
    }

    /// The sync step of `target`.
    pub fn sync_step(&self, target: NativeTarget) -> Result<StepId, BuildError> {
        self.graph
            .require(&sync_step_name(target, &self.configuration))
    }

    /// `roots` and everything they depend on.
    pub fn select(&self, roots: &[StepId]) -> HashSet<StepId> {
        self.graph.closure(roots)
    }

    /// JSON view of the selected steps in execution order.
    pub fn to_json(&self, selected: &HashSet<StepId>) -> Result<serde_json::Value> {
        let order = self.graph.topological_order()?;
        let steps: Vec<PlannedStep<'_>> = order
            .into_iter()
            .filter(|id| selected.contains(id))
            .map(|id| PlannedStep {
                step: self.graph.step(id),
                depends_on: self
                    .graph
                    .prerequisites(id)
                    .into_iter()
                    .filter(|p| selected.contains(p))
                    .map(|p| self.graph.step(p).name.as_str())
                    .collect(),
            })
            .collect();

        Ok(serde_json::json!({
            "configuration": self.configuration,
            "targets": self.targets,
            "steps": steps,
        }))
    }
}
