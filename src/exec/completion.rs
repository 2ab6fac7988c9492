// src/exec/completion.rs

//! Single-resolution completion signal.

use std::sync::Mutex;

use tokio::sync::oneshot;

/// Write side of a oneshot that can be resolved at most once, even when
/// several parties race to resolve it.
#[derive(Debug)]
pub struct Completion<T> {
    tx: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Completion<T> {
    /// Create a completion and the receiver that observes it.
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Resolve with `value`.
    ///
    /// Returns `false` if the completion was already resolved or the
    /// receiver is gone; `value` is dropped in that case.
    pub fn resolve(&self, value: T) -> bool {
        let sender = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self.tx.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}
