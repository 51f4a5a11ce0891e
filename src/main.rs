//! Main entry point for rusty-exec.
//!
//! Runs one program in the foreground the way the shell would:
//! `rusty-exec <program> [args...]`. Ctrl-C interrupts the child instead of
//! killing this process. Exits 0 when the program succeeded, 1 otherwise.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusty_exec::utils::{self, fs::resolve_executable};
use rusty_exec::{
    CurrentDir, ExecConfig, ExecutionRequest, Launcher, MemorySink, SystemTerminal,
    WorkingDirectory,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging before anything else
    let _log_guard = utils::logger::init_logging("rusty-exec");

    let mut args = std::env::args().skip(1);
    let Some(program) = args.next() else {
        eprintln!("usage: rusty-exec <program> [args...]");
        return Ok(ExitCode::from(2));
    };
    let program_args: Vec<String> = args.collect();

    let config = ExecConfig::from_env().context("Failed to load execution config")?;
    let cwd = CurrentDir::capture().context("Failed to read the current directory")?;

    let executable = locate(&program, &cwd);
    tracing::debug!(program = %program, executable = %executable.display(), "Resolved program");

    let sink = MemorySink::new();
    let launcher = Launcher::new(config, Arc::new(SystemTerminal), Arc::new(sink.clone()));
    let registry = launcher.registry().clone();
    let request = ExecutionRequest::from_provider(executable, program_args, &cwd);

    // Forward Ctrl-C to the foreground child for as long as it runs
    let interrupter = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !registry.interrupt() {
                tracing::debug!("Ctrl-C with no foreground process");
            }
        }
    });

    let success = tokio::task::spawn_blocking(move || launcher.execute(&request))
        .await
        .context("Execution task panicked")?;
    interrupter.abort();

    tracing::info!(success, "Execution finished");
    tracing::debug!(
        last_output_bytes = sink.last_output().len(),
        last_error_bytes = sink.last_error().len(),
        "Published execution results"
    );

    Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Find the program on PATH, expanding a leading `~/`.
///
/// Unresolvable names are passed through unchanged so the launcher reports
/// the launch failure itself.
fn locate(program: &str, cwd: &CurrentDir) -> PathBuf {
    let expanded = match (program.strip_prefix("~/"), utils::fs::home_directory()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().into_owned(),
        _ => program.to_string(),
    };

    let path_var = std::env::var_os("PATH");
    resolve_executable(&expanded, path_var.as_deref(), &cwd.current_directory())
        .unwrap_or_else(|| PathBuf::from(expanded))
}
