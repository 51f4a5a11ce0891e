//! Shell-side collaborators the executor reads from and writes to.
//!
//! - [`WorkingDirectory`]: where a command runs, read at launch time
//! - [`ResultSink`]: where the captured output of the last command goes

mod cwd;
mod sink;

pub use cwd::{CurrentDir, WorkingDirectory};
pub use sink::{MemorySink, ResultSink};
