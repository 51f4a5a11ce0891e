//! Current working directory tracking.
//!
//! The shell owns the working directory; the executor only reads it at the
//! moment a command is launched.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Read-only access to the shell's working directory.
pub trait WorkingDirectory: Send + Sync {
    fn current_directory(&self) -> PathBuf;
}

/// A settable working directory shared between the shell and the executor.
#[derive(Clone, Debug)]
pub struct CurrentDir {
    path: Arc<RwLock<PathBuf>>,
}

impl Default for CurrentDir {
    fn default() -> Self {
        Self::capture().unwrap_or_else(|| Self::new("."))
    }
}

impl CurrentDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(RwLock::new(path.into())),
        }
    }

    /// Capture the current working directory from the process.
    pub fn capture() -> Option<Self> {
        env::current_dir().ok().map(Self::new)
    }

    /// Update the current working directory (e.g. after `cd`).
    pub fn update(&self, new_path: impl AsRef<Path>) {
        let mut path = self.path.write().unwrap_or_else(PoisonError::into_inner);
        *path = new_path.as_ref().to_path_buf();
    }
}

impl WorkingDirectory for CurrentDir {
    fn current_directory(&self) -> PathBuf {
        self.path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
