// src/exec/backend.rs

//! Pluggable process execution capability.
//!
//! Callers that launch programs take a `&dyn ProcessExecutor` instead of
//! calling [`run_process`] directly, so tests can swap in a fake that never
//! spawns anything.

use std::future::Future;
use std::pin::Pin;

use crate::exec::process_runner::run_process;
use crate::exec::spec::ProcessSpec;
use crate::result::ExecutionResult;

/// Trait abstracting how a [`ProcessSpec`] is executed.
///
/// Implementations must always produce exactly one [`ExecutionResult`] and
/// must not panic on runtime failures.
pub trait ProcessExecutor: Send + Sync {
    fn run<'a>(
        &'a self,
        spec: &'a ProcessSpec,
        prefix: &'a str,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>>;
}

/// Real executor backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessExecutor;

impl ProcessExecutor for TokioProcessExecutor {
    fn run<'a>(
        &'a self,
        spec: &'a ProcessSpec,
        prefix: &'a str,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>> {
        Box::pin(run_process(spec, prefix))
    }
}
