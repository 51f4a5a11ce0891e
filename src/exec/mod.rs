//! Foreground process execution.
//!
//! A [`Launcher`] runs one external program at a time with stdin inherited,
//! streams its output to the terminal while capturing it, and reports the
//! outcome through a [`Reporter`]. The running child is visible to other
//! threads through a [`ProcessRegistry`] so it can be interrupted.

mod error;
mod launcher;
pub mod pump;
mod registry;
mod reporter;

use std::path::{Path, PathBuf};

pub use error::ExecError;
pub use launcher::Launcher;
pub use registry::ProcessRegistry;
pub use reporter::Reporter;

use crate::context::WorkingDirectory;

/// What to run and where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionRequest {
    executable: PathBuf,
    args: Vec<String>,
    working_directory: PathBuf,
}

impl ExecutionRequest {
    pub fn new(
        executable: impl Into<PathBuf>,
        args: Vec<String>,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executable: executable.into(),
            args,
            working_directory: working_directory.into(),
        }
    }

    /// Build a request that runs in the provider's current directory.
    pub fn from_provider(
        executable: impl Into<PathBuf>,
        args: Vec<String>,
        cwd: &dyn WorkingDirectory,
    ) -> Self {
        Self::new(executable, args, cwd.current_directory())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }
}

/// Raw bytes captured from the child.
///
/// `stderr` is `None` when the redirect policy merged it into `stdout`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Option<Vec<u8>>,
}

impl CapturedOutput {
    pub fn separate(stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            stdout,
            stderr: Some(stderr),
        }
    }

    pub fn merged(output: Vec<u8>) -> Self {
        Self {
            stdout: output,
            stderr: None,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.stderr.is_none()
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> Option<String> {
        self.stderr
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Outcome of a child that ran to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub success: bool,
    pub captured: CapturedOutput,
}

impl ExecutionResult {
    pub fn new(exit_code: i32, captured: CapturedOutput) -> Self {
        Self {
            exit_code,
            success: exit_code == 0,
            captured,
        }
    }
}
