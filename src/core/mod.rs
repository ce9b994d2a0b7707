//! Core data structures for Podforge.
//!
//! This module contains the foundational types used throughout Podforge:
//! - Apple SDKs, architectures and Kotlin/Native targets
//! - Pod declarations and the pod registry
//! - Source sets and the enabled target set
//! - Manifests and loaded projects

pub mod errors;
pub mod framework;
pub mod manifest;
pub mod pod;
pub mod project;
pub mod registry;
pub mod source_set;
pub mod target;

pub use errors::ConfigError;
pub use framework::FrameworkConfig;
pub use manifest::{find_manifest, Manifest, MANIFEST_NAME};
pub use pod::{PodDescriptor, PodSpec};
pub use project::{Project, Settings};
pub use registry::PodRegistry;
pub use source_set::{TargetFlags, TargetSet};
pub use target::{Arch, CompileStepKey, NativeTarget, Sdk};
