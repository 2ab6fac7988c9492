use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use runxfer::ExecutionResult;
use runxfer::exec::{ProcessExecutor, ProcessSpec};

/// A fake executor that:
/// - records which specs were "run"
/// - immediately reports success (or failure) without spawning anything.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<ProcessSpec>>>,
    fail: bool,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every run as a non-zero exit.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn executed(&self) -> Vec<ProcessSpec> {
        self.executed.lock().unwrap().clone()
    }
}

impl ProcessExecutor for FakeExecutor {
    fn run<'a>(
        &'a self,
        spec: &'a ProcessSpec,
        prefix: &'a str,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(spec.clone());
            if self.fail {
                ExecutionResult::failed(prefix, format!("fake failure of {}", spec.command_line()))
            } else {
                ExecutionResult::ok(prefix, format!("ran {}", spec.command_line()))
            }
        })
    }
}
