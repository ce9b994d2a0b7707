//! Build event types for JSON output.
//!
//! These events are emitted one JSON object per line when using
//! `--message-format=json`.
//!
//! # Event Types
//!
//! - `build-started`: The selected steps are about to run
//! - `step-started`: A step began running
//! - `step-output`: One line of toolchain output
//! - `step-finished`: A step succeeded, failed or was skipped
//! - `build-finished`: Build completed (success or failure)
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::io::Write;

use serde::Serialize;

use crate::util::process::OutputStream;

/// Final status of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    /// A prerequisite failed; the step never ran
    UpstreamFailed,
    /// The build stopped before the step could start
    NotRun,
}

/// A build event emitted during the build process.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    #[serde(rename = "build-started")]
    BuildStarted {
        project: String,
        configuration: String,
        /// Number of steps selected to run
        steps: usize,
    },

    #[serde(rename = "step-started")]
    StepStarted { step: String, kind: String },

    #[serde(rename = "step-output")]
    StepOutput {
        step: String,
        stream: &'static str,
        line: String,
    },

    #[serde(rename = "step-finished")]
    StepFinished {
        step: String,
        status: StepStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    #[serde(rename = "build-finished")]
    BuildFinished {
        success: bool,
        duration_ms: u64,
        succeeded: usize,
        failed: usize,
        not_run: usize,
    },
}

impl BuildEvent {
    pub fn started(project: impl Into<String>, configuration: impl Into<String>, steps: usize) -> Self {
        BuildEvent::BuildStarted {
            project: project.into(),
            configuration: configuration.into(),
            steps,
        }
    }

    pub fn step_started(step: impl Into<String>, kind: impl Into<String>) -> Self {
        BuildEvent::StepStarted {
            step: step.into(),
            kind: kind.into(),
        }
    }

    pub fn output(step: impl Into<String>, stream: OutputStream, line: impl Into<String>) -> Self {
        BuildEvent::StepOutput {
            step: step.into(),
            stream: match stream {
                OutputStream::Stdout => "stdout",
                OutputStream::Stderr => "stderr",
            },
            line: line.into(),
        }
    }

    pub fn step_finished(
        step: impl Into<String>,
        status: StepStatus,
        duration_ms: Option<u64>,
        message: Option<String>,
    ) -> Self {
        BuildEvent::StepFinished {
            step: step.into(),
            status,
            duration_ms,
            message,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receives build events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &BuildEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &BuildEvent) {}
}

/// Writes every event as a JSON line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesSink;

impl EventSink for JsonLinesSink {
    fn emit(&self, event: &BuildEvent) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", event.to_json()) {
            tracing::debug!("failed to write build event: {}", e);
        }
    }
}
