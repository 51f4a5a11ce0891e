//! Launching a foreground child and collecting its result.
//!
//! One call to [`Launcher::execute`] runs one program:
//! spawn with stdin inherited, register in the process slot, start one pump
//! per output pipe, wait for exit, join the pumps, report. The registry entry
//! is cleared by a drop guard so every exit path releases it.

use std::io::{self, PipeReader};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::pump::spawn_pump;
use super::registry::{SharedChild, lock_child};
use super::{
    CapturedOutput, ExecError, ExecutionRequest, ExecutionResult, ProcessRegistry, Reporter,
};
use crate::config::{ExecConfig, RedirectPolicy};
use crate::context::ResultSink;
use crate::term::TerminalCapability;
use crate::utils::guard::Defer;

/// Runs external programs in the foreground.
pub struct Launcher {
    config: ExecConfig,
    registry: ProcessRegistry,
    terminal: Arc<dyn TerminalCapability>,
    reporter: Reporter,
}

/// Where the child's output comes from once it is running.
enum Outputs {
    Separate(ChildStdout, ChildStderr),
    Merged(PipeReader),
}

impl Launcher {
    /// The launcher's process slot takes its interrupt grace period from
    /// `config`; share it with other threads through [`Launcher::registry`].
    pub fn new(
        config: ExecConfig,
        terminal: Arc<dyn TerminalCapability>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let registry = ProcessRegistry::with_grace_period(config.interrupt_grace());
        let reporter = Reporter::new(terminal.clone(), sink);
        Self {
            config,
            registry,
            terminal,
            reporter,
        }
    }

    /// The slot other threads use to interrupt this launcher's child.
    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Run the request and report the outcome. Never fails; every problem
    /// ends up in the error sink and a `false` return.
    pub fn execute(&self, request: &ExecutionRequest) -> bool {
        match self.run(request) {
            Ok(result) => self.reporter.report(result.exit_code, &result.captured),
            Err(err) => {
                error!("Execution of {} failed: {}", request.executable().display(), err);
                self.reporter.report_failure(&format!("Execution failed: {}", err))
            }
        }
    }

    /// Run the request to completion without reporting.
    pub fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecError> {
        let snapshot = self.terminal.snapshot();

        let mut command = Command::new(request.executable());
        command
            .args(request.args())
            .current_dir(request.working_directory())
            .stdin(Stdio::inherit());
        let merged_reader = self.wire_outputs(&mut command)?;

        let child = command.spawn().map_err(|source| ExecError::Launch {
            path: request.executable().to_path_buf(),
            source,
        })?;
        // The command still holds the parent's copies of a merged pipe's write end
        drop(command);

        let pid = child.id();
        info!(pid, executable = %request.executable().display(), "Launched foreground process");

        let child: SharedChild = Arc::new(Mutex::new(child));
        self.registry.register(&child);
        let _cleanup = Defer::with(|| {
            self.registry.clear();
            reap_if_alive(&child);
        });

        let outputs = match merged_reader {
            Some(reader) => Outputs::Merged(reader),
            None => take_pipes(&child)?,
        };

        let chunk = self.config.chunk_size;
        let ansi = snapshot.ansi_safe;
        let (stdout_pump, stderr_pump) = match outputs {
            Outputs::Separate(stdout, stderr) => (
                spawn_pump("stdout", stdout, self.terminal.writer(), ansi, chunk)?,
                Some(spawn_pump("stderr", stderr, self.terminal.error_writer(), ansi, chunk)?),
            ),
            Outputs::Merged(reader) => {
                let pump = spawn_pump("output", reader, self.terminal.writer(), ansi, chunk)?;
                (pump, None)
            }
        };

        let status = wait_for_exit(&child, pid, self.config.poll_interval())?;
        let exit_code = normalize_exit(status);
        debug!(pid, exit_code, "Foreground process exited");

        let stdout = join_pump(stdout_pump);
        let captured = match stderr_pump {
            Some(handle) => CapturedOutput::separate(stdout, join_pump(handle)),
            None => CapturedOutput::merged(stdout),
        };

        Ok(ExecutionResult::new(exit_code, captured))
    }

    /// Configure stdout/stderr per the redirect policy. For merged policies
    /// returns the read end of the shared pipe.
    fn wire_outputs(&self, command: &mut Command) -> io::Result<Option<PipeReader>> {
        let policy = self.config.redirect;
        if !policy.is_merged() {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
            return Ok(None);
        }

        if policy == RedirectPolicy::MergedColor {
            command.env("FORCE_COLOR", "1").env("CLICOLOR_FORCE", "1");
            if std::env::var_os("TERM").is_none() {
                command.env("TERM", "xterm-256color");
            }
        }
        let (reader, writer) = io::pipe()?;
        command.stdout(writer.try_clone()?).stderr(writer);
        Ok(Some(reader))
    }
}

fn take_pipes(child: &Mutex<Child>) -> Result<Outputs, ExecError> {
    let mut child = lock_child(child);
    match (child.stdout.take(), child.stderr.take()) {
        (Some(stdout), Some(stderr)) => Ok(Outputs::Separate(stdout, stderr)),
        _ => Err(ExecError::Io(io::Error::other("child output pipes were not captured"))),
    }
}

/// Poll until the child exits.
///
/// The child is only reaped while its lock is held, so a concurrent
/// `interrupt()` never signals a PID that has already been recycled.
fn wait_for_exit(child: &Mutex<Child>, pid: u32, poll: Duration) -> Result<ExitStatus, ExecError> {
    loop {
        let polled = lock_child(child).try_wait();
        match polled {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => thread::sleep(poll),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(ExecError::Wait { pid, source }),
        }
    }
}

fn join_pump(handle: JoinHandle<Vec<u8>>) -> Vec<u8> {
    handle.join().unwrap_or_else(|_| {
        warn!("Output pump panicked; its capture is lost");
        Vec::new()
    })
}

/// Kill and reap the child if an early return left it running.
fn reap_if_alive(child: &Mutex<Child>) {
    let mut child = lock_child(child);
    if let Ok(None) = child.try_wait() {
        warn!(pid = child.id(), "Foreground process still running at cleanup, killing");
        if let Err(e) = child.kill() {
            warn!("Failed to kill process at cleanup: {}", e);
        }
        if let Err(e) = child.wait() {
            warn!("Failed to reap process at cleanup: {}", e);
        }
    }
}

/// Normalize an exit status; signal deaths map to `128 + signal` like a shell.
fn normalize_exit(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
