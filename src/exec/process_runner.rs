// src/exec/process_runner.rs

//! Run one external program to completion and fold everything it did into a
//! single [`ExecutionResult`].

use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::exec::completion::Completion;
use crate::exec::output::{OutputLog, spawn_line_reader};
use crate::exec::spec::ProcessSpec;
use crate::result::ExecutionResult;

/// How the child process left the `Started` state.
#[derive(Debug)]
enum ExitEvent {
    Exited(ExitStatus),
    Killed,
    WaitFailed(std::io::Error),
}

/// Run `spec` and wait until it has exited and its output is drained.
///
/// - `success` is `true` iff the exit code is 0.
/// - stdout lines are logged as `"<prefix>: <line>"`, stderr lines as
///   `"<prefix> ERR: <line>"`, joined with `\n` in arrival order.
/// - Spawn and I/O failures become `"<prefix>: Exception <message>"`.
///
/// This never returns an error and never retries.
pub async fn run_process(spec: &ProcessSpec, prefix: &str) -> ExecutionResult {
    match run_process_inner(spec, prefix).await {
        Ok(result) => result,
        Err(err) => {
            let message = format!("{err:#}");
            error!(
                prefix,
                command = %spec.command_line(),
                error = %message,
                "process execution error"
            );
            ExecutionResult::exception(prefix, message)
        }
    }
}

async fn run_process_inner(spec: &ProcessSpec, prefix: &str) -> Result<ExecutionResult> {
    info!(
        prefix,
        command = %spec.command_line(),
        cwd = ?spec.working_directory(),
        extra_env = spec.environment().len(),
        "starting process"
    );

    let mut cmd = Command::new(spec.command());
    cmd.args(spec.arguments())
        .envs(spec.environment())
        .current_dir(spec.working_directory())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process '{}'", spec.command()))?;

    debug!(prefix, pid = ?child.id(), "process started");

    let log = OutputLog::default();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(stdout, log.clone(), format!("{prefix}: ")));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(stderr, log.clone(), format!("{prefix} ERR: ")));
    }

    let (completion, mut exited) = Completion::new();
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    tokio::spawn(handle_exit(child, cancel_rx, readers, completion));

    let event = match spec.timeout() {
        Some(limit) => match tokio::time::timeout(limit, &mut exited).await {
            Ok(event) => event,
            Err(_) => {
                warn!(prefix, timeout = ?limit, "process timed out; killing");
                let _ = cancel_tx.send(());
                exited.await
            }
        },
        None => exited.await,
    }
    .context("process exit handler stopped before reporting an exit")?;

    let lines = log.snapshot();

    match event {
        ExitEvent::Exited(status) => {
            let code = status.code();
            info!(
                prefix,
                exit_code = ?code,
                success = status.success(),
                lines = lines.len(),
                "process exited"
            );
            let output = if lines.is_empty() {
                describe_silent_exit(prefix, status)
            } else {
                lines.join("\n")
            };
            Ok(ExecutionResult::from_exit(status.success(), output, code))
        }
        ExitEvent::Killed => {
            let limit = spec.timeout().unwrap_or_default();
            let mut output = vec![format!(
                "{prefix}: ERR timed out after {}s",
                limit.as_secs_f64()
            )];
            output.extend(lines);
            Ok(ExecutionResult::from_exit(false, output.join("\n"), None))
        }
        ExitEvent::WaitFailed(e) => Err(e).context("waiting for process exit"),
    }
}

/// Exit handler: waits for the child (or a kill request), drains the output
/// readers, then resolves `completion` exactly once.
///
/// A kill request that arrives while draining wins too: a background
/// grandchild can hold the pipes open long after the child has exited.
async fn handle_exit(
    mut child: Child,
    cancel_rx: oneshot::Receiver<()>,
    mut readers: Vec<JoinHandle<()>>,
    completion: Completion<ExitEvent>,
) {
    // A dropped sender means nobody will ever ask for a kill.
    let cancelled = async move {
        if cancel_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(cancelled);

    let event = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => ExitEvent::Exited(status),
            Err(e) => ExitEvent::WaitFailed(e),
        },
        () = &mut cancelled => {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill timed out process");
            }
            ExitEvent::Killed
        }
    };

    let event = match event {
        ExitEvent::Killed => {
            readers.iter().for_each(JoinHandle::abort);
            ExitEvent::Killed
        }
        exited => {
            let drained = tokio::select! {
                () = drain_readers(&mut readers) => true,
                () = &mut cancelled => false,
            };
            if drained {
                exited
            } else {
                warn!("output still open after exit; abandoning readers");
                readers.iter().for_each(JoinHandle::abort);
                ExitEvent::Killed
            }
        }
    };

    if !completion.resolve(event) {
        debug!("process exit already reported; ignoring duplicate exit signal");
    }
}

async fn drain_readers(readers: &mut [JoinHandle<()>]) {
    for reader in readers.iter_mut() {
        if let Err(e) = reader.await {
            warn!(error = %e, "output reader task failed");
        }
    }
}

fn describe_silent_exit(prefix: &str, status: ExitStatus) -> String {
    match status.code() {
        Some(0) => format!("{prefix}: exited with code 0"),
        Some(code) => format!("{prefix}: ERR exited with code {code}"),
        None => format!("{prefix}: ERR terminated without an exit code"),
    }
}
