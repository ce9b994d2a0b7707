//! The step graph: an explicit DAG of build steps.
//!
//! Edges point from a prerequisite to the step that depends on it.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;

use crate::builder::errors::BuildError;
use crate::builder::interop::InteropDescriptor;
use crate::builder::settings::TargetSettings;
use crate::core::target::{CompileStepKey, NativeTarget};

/// Identifier of a step within its graph.
pub type StepId = NodeIndex;

/// What a step does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepKind {
    /// Compile one pod for one (sdk, arch) with xcodebuild.
    CompilePod {
        key: CompileStepKey,
        scheme: String,
        frameworks_dir: PathBuf,
    },
    /// Write the interop definition file of one pod for one target.
    GenerateDef {
        interop: InteropDescriptor,
        def_file: PathBuf,
        compile_key: Option<CompileStepKey>,
    },
    /// Write the link settings of one target.
    WriteSettings {
        settings: TargetSettings,
        path: PathBuf,
    },
    /// Run the host command that links the framework.
    Link {
        target: NativeTarget,
        program: String,
        args: Vec<String>,
    },
    /// Copy the linked framework to its stable location.
    SyncFramework {
        target: NativeTarget,
        src: PathBuf,
        dest: PathBuf,
    },
}

/// A named build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub name: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Step {
            name: name.into(),
            kind,
        }
    }

    /// Short kind label (`compile-pod`, `sync-framework`, ...).
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            StepKind::CompilePod { .. } => "compile-pod",
            StepKind::GenerateDef { .. } => "generate-def",
            StepKind::WriteSettings { .. } => "write-settings",
            StepKind::Link { .. } => "link",
            StepKind::SyncFramework { .. } => "sync-framework",
        }
    }

    /// Whether the step produces something `target` uses.
    pub fn applies_to(&self, target: NativeTarget) -> bool {
        match &self.kind {
            StepKind::CompilePod { key, .. } => {
                key.sdk == target.sdk() && key.arch == target.arch()
            }
            StepKind::GenerateDef { interop, .. } => interop.target == target,
            StepKind::WriteSettings { settings, .. } => settings.target == target,
            StepKind::Link { target: t, .. } | StepKind::SyncFramework { target: t, .. } => {
                *t == target
            }
        }
    }

    pub fn is_compile(&self) -> bool {
        matches!(self.kind, StepKind::CompilePod { .. })
    }
}

/// Directed acyclic graph of steps, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct StepGraph {
    graph: DiGraph<Step, ()>,
    by_name: HashMap<String, StepId>,
}

impl StepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step, or return the existing identical step with the same name.
    ///
    /// A different step under an existing name is an error.
    pub fn add_step(&mut self, step: Step) -> Result<StepId, BuildError> {
        if let Some(&id) = self.by_name.get(&step.name) {
            if self.graph[id] != step {
                return Err(BuildError::DuplicateStep { name: step.name });
            }
            return Ok(id);
        }
        let name = step.name.clone();
        let id = self.graph.add_node(step);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Make `dependent` run after `prerequisite`.
    pub fn add_edge(&mut self, prerequisite: StepId, dependent: StepId) {
        if !self.graph.contains_edge(prerequisite, dependent) {
            self.graph.add_edge(prerequisite, dependent, ());
        }
    }

    pub fn step(&self, id: StepId) -> &Step {
        &self.graph[id]
    }

    pub fn find(&self, name: &str) -> Option<StepId> {
        self.by_name.get(name).copied()
    }

    /// Look up a step by name, listing known names on failure.
    pub fn require(&self, name: &str) -> Result<StepId, BuildError> {
        self.find(name).ok_or_else(|| {
            let mut available: Vec<String> = self.by_name.keys().cloned().collect();
            available.sort();
            BuildError::UnknownStep {
                name: name.to_string(),
                available,
            }
        })
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All step ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = StepId> + '_ {
        self.graph.node_indices()
    }

    /// Direct prerequisites of `id`.
    pub fn prerequisites(&self, id: StepId) -> Vec<StepId> {
        let mut ids: Vec<_> = self
            .graph
            .neighbors_directed(id, Direction::Incoming)
            .collect();
        ids.sort();
        ids
    }

    /// Every step that transitively depends on `id`.
    pub fn transitive_dependents(&self, id: StepId) -> HashSet<StepId> {
        self.walk(vec![id], Direction::Outgoing, false)
    }

    /// `roots` plus every transitive prerequisite.
    pub fn closure(&self, roots: &[StepId]) -> HashSet<StepId> {
        self.walk(roots.to_vec(), Direction::Incoming, true)
    }

    fn walk(&self, start: Vec<StepId>, dir: Direction, keep_start: bool) -> HashSet<StepId> {
        let mut visited = HashSet::new();
        let mut stack = start.clone();

        while let Some(current) = stack.pop() {
            if visited.insert(current) {
                stack.extend(self.graph.neighbors_directed(current, dir));
            }
        }

        if !keep_start {
            for id in start {
                visited.remove(&id);
            }
        }
        visited
    }

    /// Fail if the graph contains a cycle.
    pub fn validate(&self) -> Result<(), BuildError> {
        self.topological_order().map(|_| ())
    }

    /// Steps ordered so every prerequisite comes before its dependents.
    pub fn topological_order(&self) -> Result<Vec<StepId>, BuildError> {
        toposort(&self.graph, None).map_err(|cycle| {
            let node = cycle.node_id();
            let steps = tarjan_scc(&self.graph)
                .into_iter()
                .find(|scc| scc.contains(&node))
                .map(|scc| {
                    let mut names: Vec<String> =
                        scc.iter().map(|&n| self.graph[n].name.clone()).collect();
                    names.push(self.graph[node].name.clone());
                    names
                })
                .unwrap_or_else(|| vec![self.graph[node].name.clone()]);
            BuildError::CycleDetected { steps }
        })
    }
}
