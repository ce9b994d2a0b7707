//! High-level operations.
//!
//! This module contains the implementation of Podforge commands.

pub mod doctor;
pub mod podforge_build;
pub mod podforge_targets;

pub use doctor::{doctor, format_report, DoctorOptions, DoctorReport};
pub use podforge_build::{build, plan, select_steps, BuildOptions};
pub use podforge_targets::{format_targets, render_def};
