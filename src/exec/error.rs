//! Error types for foreground execution

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop an execution before it produces an exit code.
///
/// A child that runs to completion with a nonzero status is not an error; it
/// is an [`ExecutionResult`](super::ExecutionResult) with `success == false`.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("cannot start {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("waiting for process {pid} failed: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_names_the_executable() {
        let err = ExecError::Launch {
            path: PathBuf::from("/usr/bin/nope"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            err.to_string(),
            "cannot start /usr/bin/nope: No such file or directory"
        );
    }

    #[test]
    fn test_error_from_io() {
        let err = ExecError::from(io::Error::other("pipe closed"));
        assert!(err.to_string().contains("I/O error"));
    }
}
