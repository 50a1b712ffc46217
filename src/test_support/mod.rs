//! Test utilities and mocks for tcconf unit tests.
//!
//! The resolver only reaches the outside world through
//! [`Runner`](crate::util::process::Runner), so a [`MockRunner`] is enough
//! to drive compiler probes and tool queries without touching the system.
//!
//! # Example
//!
//! ```rust,ignore
//! use tcconf::test_support::{MockRunner, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let mut runner = MockRunner::new();
//!     runner.with_program("perl", "/usr/bin/perl");
//!     runner.expect_prefix("/usr/bin/perl -V:version", MockProcessOutput::success("version='5.26.1';"));
//!
//!     // Use the runner in tests...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::util::process::{CommandOutput, ProcessBuilder, Runner};

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Create a failure output that still printed something on stdout.
    pub fn failure_with_stdout(status: i32, stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    fn to_output(&self) -> CommandOutput {
        CommandOutput {
            status: Some(self.status),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockRunner.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
        }
    }
}

/// Mock runner for testing tool discovery and command execution.
///
/// Programs are "installed" with [`MockRunner::with_program`]; commands are
/// answered by the first matching expectation. Any other command fails.
#[derive(Debug, Default)]
pub struct MockRunner {
    programs: HashMap<String, PathBuf>,
    expectations: Vec<(CommandPattern, MockProcessOutput)>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    /// Create a runner with no programs and no expectations.
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Make `name` resolvable to `path`.
    pub fn with_program(&mut self, name: &str, path: impl Into<PathBuf>) -> &mut Self {
        self.programs.insert(name.to_string(), path.into());
        self
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expectations
            .push((CommandPattern::Exact(cmd.to_string()), output));
        self
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expectations
            .push((CommandPattern::StartsWith(prefix.to_string()), output));
        self
    }

    /// Get all commands that were run.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Runner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput> {
        let full_cmd = cmd.display_command();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(full_cmd.clone());
        }

        for (pattern, output) in &self.expectations {
            if pattern.matches(&full_cmd) {
                return Ok(output.to_output());
            }
        }

        bail!("unexpected command: {}", full_cmd)
    }

    fn find(&self, program: &str) -> Option<PathBuf> {
        self.programs.get(program).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_basic() {
        let mut runner = MockRunner::new();
        runner.with_program("gcc", "/usr/bin/gcc");
        runner.expect("/usr/bin/gcc --version", MockProcessOutput::success("gcc 12.0.0"));
        runner.expect_prefix("/usr/bin/gcc -E", MockProcessOutput::failure(1, "oops"));

        assert_eq!(runner.find("gcc"), Some(PathBuf::from("/usr/bin/gcc")));
        assert_eq!(runner.find("clang"), None);

        let output = runner
            .run(&ProcessBuilder::new("/usr/bin/gcc").arg("--version"))
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "gcc 12.0.0");

        let output = runner
            .run(&ProcessBuilder::new("/usr/bin/gcc").args(["-E", "-"]))
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.stderr, "oops");

        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn test_mock_runner_unexpected() {
        let runner = MockRunner::new();
        assert!(runner.run(&ProcessBuilder::new("unknown")).is_err());
    }
}
