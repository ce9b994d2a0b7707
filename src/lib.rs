//! Podforge - builds CocoaPods dependencies for Kotlin Multiplatform projects
//!
//! This crate provides the core library functionality for Podforge,
//! including pod registration, target enumeration, build planning and
//! execution of `xcodebuild`.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for Podforge unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a scripted command runner and an event sink that records
/// everything it receives.
#[cfg(test)]
pub mod test_support;

pub use self::core::{manifest::Manifest, project::Project, target::NativeTarget};
pub use util::context::GlobalContext;
