// src/result.rs

//! The uniform outcome returned by every operation in this crate.

use std::fmt;

/// Outcome of a single process run, transfer or dispatch.
///
/// `output` is a newline-joined, human-readable log and is always populated,
/// on failure as well as on success. Callers must decide pass/fail from
/// [`ExecutionResult::success`], never by parsing `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    success: bool,
    output: String,
    exit_code: Option<i32>,
}

impl ExecutionResult {
    /// Successful result rendered as `"<prefix>: <message>"`.
    pub fn ok(prefix: &str, message: impl fmt::Display) -> Self {
        Self {
            success: true,
            output: format!("{prefix}: {message}"),
            exit_code: None,
        }
    }

    /// Failed result rendered as `"<prefix>: ERR <message>"`.
    pub fn failed(prefix: &str, message: impl fmt::Display) -> Self {
        Self {
            success: false,
            output: format!("{prefix}: ERR {message}"),
            exit_code: None,
        }
    }

    /// Failed result for an error caught at an operation boundary, rendered
    /// as `"<prefix>: Exception <message>"`.
    pub fn exception(prefix: &str, message: impl fmt::Display) -> Self {
        Self {
            success: false,
            output: format!("{prefix}: Exception {message}"),
            exit_code: None,
        }
    }

    /// Result of a process that ran to exit.
    pub(crate) fn from_exit(success: bool, output: String, exit_code: Option<i32>) -> Self {
        Self {
            success,
            output,
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Exit code of the process, if this result came from a process that
    /// exited normally. Always `None` for transfers and dispatches.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output)
    }
}
