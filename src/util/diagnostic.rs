//! User-friendly diagnostic messages.
//!
//! Every error shown to the user carries the root cause, the surrounding
//! context and at least one concrete next step.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// No `Podforge.toml` was found.
    pub const NO_MANIFEST: &str =
        "Create a Podforge.toml in the project root with a [cocoapods] section";

    /// The pods project is not configured.
    pub const NO_PODS_PROJECT: &str =
        "Set [cocoapods] project in Podforge.toml or export PODFORGE_PODS_PROJECT";

    /// A target name did not match.
    pub const TARGET_NOT_FOUND: &str = "Run `podforge targets` to see enabled targets";

    /// The build failed.
    pub const BUILD_FAILED: &str = "Run `podforge build --verbose` for more details";

    /// xcodebuild could not be found.
    pub const NO_XCODEBUILD: &str =
        "Install Xcode command line tools or pass --xcodebuild <path>";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related file, if any
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m".to_string(),
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m".to_string(),
            (false, severity) => severity.to_string(),
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("`cocoapodBuildAFNetworkingIphoneosArm64` failed")
            .with_location("ios-app/Pods/Pods.xcodeproj")
            .with_context("xcodebuild exited with exit code 65")
            .with_suggestion("Open the pods project in Xcode and build the scheme")
            .with_suggestion("Run `podforge build --verbose`");

        let output = diag.format(false);
        assert!(output.contains("error: `cocoapodBuildAFNetworkingIphoneosArm64` failed"));
        assert!(output.contains("--> ios-app/Pods/Pods.xcodeproj"));
        assert!(output.contains("exit code 65"));
        assert!(output.contains("consider:"));
        assert!(output.contains("2. Run `podforge build --verbose`"));
    }

    #[test]
    fn test_warning_without_suggestions() {
        let output = Diagnostic::warning("no pods declared").format(false);
        assert_eq!(output, "warning: no pods declared\n");
    }
}
