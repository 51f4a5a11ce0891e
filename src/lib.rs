//! rusty-exec - foreground process execution for an interactive shell
//!
//! This library runs external programs the way a shell does, including:
//! - Launching a child with the terminal's stdin, in the shell's working directory
//! - Streaming stdout/stderr to the terminal while capturing the raw bytes
//! - Stripping ANSI sequences from the visible copy on terminals that can't render them
//! - Interrupting the running child from another thread
//! - Publishing "last output" / "last error" and printing a status glyph
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rusty_exec::{
//!     CurrentDir, ExecConfig, ExecutionRequest, Launcher, MemorySink, SystemTerminal,
//! };
//!
//! let sink = MemorySink::new();
//! let launcher = Launcher::new(
//!     ExecConfig::default(),
//!     Arc::new(SystemTerminal),
//!     Arc::new(sink.clone()),
//! );
//! let registry = launcher.registry().clone();
//!
//! // `registry.interrupt()` may be called from a signal handler meanwhile
//! let cwd = CurrentDir::default();
//! let request = ExecutionRequest::from_provider("/bin/ls", vec!["-la".into()], &cwd);
//! if launcher.execute(&request) {
//!     println!("captured {} bytes", sink.last_output().len());
//! }
//! ```

pub mod config;
pub mod context;
pub mod exec;
pub mod term;
pub mod utils;

// Re-export commonly used types
pub use config::{ExecConfig, RedirectPolicy};
pub use context::{CurrentDir, MemorySink, ResultSink, WorkingDirectory};
pub use exec::{
    CapturedOutput, ExecError, ExecutionRequest, ExecutionResult, Launcher, ProcessRegistry,
    Reporter,
};
pub use term::{BufferTerminal, SystemTerminal, TerminalCapability};
