//! Test utilities and mocks for podforge unit tests.
//!
//! This module provides a scripted [`CommandRunner`] that never spawns a
//! process, and an [`EventSink`] that records every event.
//!
//! # Example
//!
//! ```rust,ignore
//! use podforge::test_support::{MockProcessOutput, MockRunner};
//!
//! let runner = MockRunner::new()
//!     .expect_contains("-scheme AFNetworking", MockProcessOutput::failure(65, "error: build failed"));
//! // Run the executor with `&runner`, then inspect `runner.calls()`.
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;

use crate::builder::events::{BuildEvent, EventSink};
use crate::util::process::{CommandRunner, OutputStream, ProcessBuilder, ProcessStatus};

/// Scripted output of one process.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MockProcessOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Runner that answers commands from expectations instead of spawning them.
///
/// Commands are matched against their display string; the first matching
/// expectation wins, otherwise the default output is used. With
/// `create_frameworks`, a successful xcodebuild call leaves
/// `<SYMROOT>/UninstalledProducts/<sdk>/<scheme>.framework` behind like the
/// real tool.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Vec<(String, MockProcessOutput)>,
    default_output: MockProcessOutput,
    create_frameworks: bool,
    calls: Mutex<Vec<ProcessBuilder>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `substring` with `output`.
    pub fn expect_contains(mut self, substring: &str, output: MockProcessOutput) -> Self {
        self.expectations.push((substring.to_string(), output));
        self
    }

    pub fn set_default(mut self, output: MockProcessOutput) -> Self {
        self.default_output = output;
        self
    }

    pub fn create_frameworks(mut self) -> Self {
        self.create_frameworks = true;
        self
    }

    /// Every command run so far, in call order.
    pub fn calls(&self) -> Vec<ProcessBuilder> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Display strings of the calls.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.display_command()).collect()
    }

    fn output_for(&self, line: &str) -> MockProcessOutput {
        self.expectations
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| self.default_output.clone())
    }

    fn leave_framework(&self, cmd: &ProcessBuilder) {
        let args = cmd.get_args();
        let value_after = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };
        let symroot = args.iter().find_map(|a| a.strip_prefix("SYMROOT="));

        if let (Some(symroot), Some(sdk), Some(scheme)) =
            (symroot, value_after("-sdk"), value_after("-scheme"))
        {
            let dir = PathBuf::from(symroot)
                .join("UninstalledProducts")
                .join(sdk)
                .join(format!("{}.framework", scheme));
            let _ = fs::create_dir_all(dir);
        }
    }
}

impl CommandRunner for MockRunner {
    fn run_streaming(
        &self,
        cmd: &ProcessBuilder,
        on_line: &(dyn Fn(OutputStream, &str) + Sync),
    ) -> Result<ProcessStatus> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(cmd.clone());
        }

        let output = self.output_for(&cmd.display_command());
        for line in output.stdout.lines() {
            on_line(OutputStream::Stdout, line);
        }
        for line in output.stderr.lines() {
            on_line(OutputStream::Stderr, line);
        }

        if output.status == 0 && self.create_frameworks {
            self.leave_framework(cmd);
        }

        Ok(ProcessStatus {
            code: Some(output.status),
        })
    }
}

/// Sink that keeps every event.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<BuildEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BuildEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &BuildEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_matches_first_expectation() {
        let runner = MockRunner::new()
            .expect_contains("-scheme Broken", MockProcessOutput::failure(65, "error: nope"))
            .set_default(MockProcessOutput::success("ok"));

        let lines = Mutex::new(Vec::new());
        let record = |stream: OutputStream, line: &str| {
            lines.lock().unwrap().push((stream, line.to_string()));
        };

        let broken = ProcessBuilder::new("xcodebuild").args(["-scheme", "Broken"]);
        let status = runner.run_streaming(&broken, &record).unwrap();
        assert_eq!(status.code, Some(65));

        let fine = ProcessBuilder::new("xcodebuild").args(["-scheme", "Fine"]);
        assert!(runner.run_streaming(&fine, &record).unwrap().success());

        assert_eq!(runner.calls().len(), 2);
        assert_eq!(
            lines.into_inner().unwrap(),
            vec![
                (OutputStream::Stderr, "error: nope".to_string()),
                (OutputStream::Stdout, "ok".to_string()),
            ]
        );
    }

    #[test]
    fn test_mock_runner_creates_frameworks() {
        let tmp = tempfile::TempDir::new().unwrap();
        let symroot = tmp.path().join("iphoneos-arm64");
        let runner = MockRunner::new().create_frameworks();

        let cmd = ProcessBuilder::new("xcodebuild")
            .args(["-scheme", "AFNetworking", "-sdk", "iphoneos"])
            .arg(format!("SYMROOT={}", symroot.display()));
        runner.run_streaming(&cmd, &|_, _| {}).unwrap();

        assert!(symroot
            .join("UninstalledProducts/iphoneos/AFNetworking.framework")
            .is_dir());
    }
}
