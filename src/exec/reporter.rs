//! Publishing execution results to the shell.
//!
//! After every execution the reporter fills the "last output" and "last error"
//! sinks and prints the status glyph line.

use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use super::CapturedOutput;
use crate::context::ResultSink;
use crate::term::{TerminalCapability, status_line};

#[derive(Clone)]
pub struct Reporter {
    terminal: Arc<dyn TerminalCapability>,
    sink: Arc<dyn ResultSink>,
}

impl Reporter {
    pub fn new(terminal: Arc<dyn TerminalCapability>, sink: Arc<dyn ResultSink>) -> Self {
        Self { terminal, sink }
    }

    /// Publish a completed execution and return whether it succeeded.
    ///
    /// On failure the separate stderr capture is preferred as the error text;
    /// when it is empty or was merged into stdout, the stdout capture is used.
    pub fn report(&self, exit_code: i32, captured: &CapturedOutput) -> bool {
        let success = exit_code == 0;
        let stdout = captured.stdout_text();

        self.sink.set_last_output(stdout.clone());
        if success {
            self.sink.set_last_error(String::new());
        } else {
            let error = match captured.stderr_text() {
                Some(stderr) if !stderr.is_empty() => stderr,
                _ => stdout,
            };
            self.sink.set_last_error(error);
        }

        self.print_status(success);
        success
    }

    /// Publish an execution that never produced an exit code.
    pub fn report_failure(&self, message: &str) -> bool {
        self.sink.set_last_error(message.to_string());
        self.print_status(false);
        false
    }

    fn print_status(&self, success: bool) {
        let snapshot = self.terminal.snapshot();
        let line = status_line(snapshot.width, success, snapshot.ansi_safe);

        let mut out = self.terminal.writer();
        if let Err(e) = writeln!(out, "{}", line).and_then(|()| out.flush()) {
            debug!("Failed to print status line: {}", e);
        }
    }
}
