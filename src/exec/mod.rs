// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs external programs with `tokio::process::Command` and reports one
//! [`crate::result::ExecutionResult`] per run.
//!
//! - [`spec`] holds the validated [`ProcessSpec`] and its builder.
//! - [`process_runner`] spawns the process, streams its output and waits for
//!   the exit.
//! - [`output`] is the shared line log and the per-stream readers.
//! - [`completion`] is the single-resolution signal fired by the exit
//!   handler.
//! - [`backend`] provides the `ProcessExecutor` trait and the production
//!   `TokioProcessExecutor`.

pub mod backend;
pub mod completion;
pub mod output;
pub mod process_runner;
pub mod spec;

pub use backend::{ProcessExecutor, TokioProcessExecutor};
pub use process_runner::run_process;
pub use spec::{ProcessSpec, ProcessSpecBuilder};
