//! Subprocess execution utilities.
//!
//! Everything that touches the outside world (preprocessor probes, Perl and
//! Python discovery, executable lookup) goes through the [`Runner`] trait so
//! the resolution pipeline can be driven by a scripted runner in tests.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Execute the command and capture its output.
    pub fn exec(&self) -> Result<CommandOutput> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Stdout of a successful run, `None` otherwise.
    pub fn stdout_if_success(self) -> Option<String> {
        if self.success() {
            Some(self.stdout)
        } else {
            None
        }
    }
}

/// Access to external programs.
pub trait Runner {
    /// Run a command to completion.
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput>;

    /// Resolve an executable: an existing path is returned as is, a bare
    /// name is searched in `PATH`.
    fn find(&self, program: &str) -> Option<PathBuf>;
}

/// Runner backed by real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput> {
        tracing::debug!("running `{}`", cmd.display_command());
        cmd.exec()
    }

    fn find(&self, program: &str) -> Option<PathBuf> {
        find_executable(program)
    }
}

/// Find an executable by path or in `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    // Only bare names are searched for
    if path.components().count() > 1 {
        return None;
    }
    which::which(name).ok()
}
