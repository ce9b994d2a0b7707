//! Pod build system.
//!
//! Planning turns registered pods and enabled targets into a step graph;
//! the executor runs the selected part of that graph.

pub mod context;
pub mod errors;
pub mod events;
pub mod executor;
pub mod graph;
pub mod interop;
pub mod plan;
pub mod settings;
pub mod sync;
pub mod xcodebuild;

pub use context::BuildContext;
pub use errors::BuildError;
pub use events::{BuildEvent, EventSink, JsonLinesSink, NullSink};
pub use executor::{BuildReport, Executor};
pub use graph::{Step, StepGraph, StepKind};
pub use plan::{BuildPlan, Planner};
