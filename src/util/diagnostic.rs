//! User-friendly diagnostic messages.
//!
//! Every fatal configuration error is rendered with its root cause, any
//! extra context, and suggested fixes.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when the toolchain parameters are incomplete.
    pub const CHECK_PARAMS: &str =
        "Check the JSON passed with `--toolchain-params` against the expected layout";

    /// Suggestion when the compiler family is not recognised.
    pub const SUPPORTED_FAMILIES: &str =
        "Set `params.type` to `gnu`, `clang`, `msvc` or `system_cxx`";

    /// Suggestion when the build type is not recognised.
    pub const BUILD_TYPES: &str = "Use debug, release, relwithdebinfo, coverage, profile, gprof, \
         valgrind, valgrind-release, nobuild or a `-release`/`-debug` suffixed type";

    /// Suggestion when no compiler could be found or probed.
    pub const SET_CC: &str = "Point the CC/CXX environment variables at a working compiler";

    /// Suggestion when the MSVC environment is not set up.
    pub const RUN_VCVARS: &str = "Run vcvars64.bat from the Visual Studio installation first";

    /// Suggestion when a system Python is used with a fixed SDK.
    pub const LOCAL_SDK: &str = "Pass `-D OS_SDK=local` or `-D USE_SYSTEM_PYTHON=yes`";
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
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
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
            output.push_str(&format!("  = {}\n", ctx));
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
        let diag = Diagnostic::error("could not determine custom compiler type: cc")
            .with_context("probed `cc -E` for predefined macros")
            .with_location("toolchain.json")
            .with_suggestion("Point CC at gcc or clang")
            .with_suggestion("Pass explicit toolchain parameters");

        let output = diag.format(false);
        assert!(output.starts_with("error: could not determine"));
        assert!(output.contains("  --> toolchain.json"));
        assert!(output.contains("  = probed `cc -E`"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("2. Pass explicit toolchain parameters"));
    }

    #[test]
    fn test_warning_without_suggestions() {
        let output = Diagnostic::warning("presets file ignored").format(false);
        assert_eq!(output, "warning: presets file ignored\n");
    }
}
