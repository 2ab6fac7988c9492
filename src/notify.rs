// src/notify.rs

//! Dispatch of notification messages to a sink.
//!
//! The pipeline reports progress by pushing JSON documents to a queue-like
//! sink. The sink is a capability passed by the caller; a missing sink is
//! reported as a failed result, not a panic.

use std::fmt::Debug;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::result::ExecutionResult;

/// Prefix of every dispatch result.
pub const QUEUE_PREFIX: &str = "QUEUE";

/// Destination for serialized notification messages.
pub trait NotificationSink: Send + Sync + Debug {
    /// Human-readable address of the sink, used in result messages.
    fn name(&self) -> String;

    fn send<'a>(&'a self, payload: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Serialize `message` as JSON and hand it to `sink`.
pub async fn dispatch_message<M>(sink: Option<&dyn NotificationSink>, message: &M) -> ExecutionResult
where
    M: Serialize + ?Sized,
{
    let Some(sink) = sink else {
        warn!("notification dispatched without a sink");
        return ExecutionResult::failed(QUEUE_PREFIX, "queue is null");
    };
    let name = sink.name();

    match send_json(sink, message).await {
        Ok(()) => {
            debug!(sink = %name, "notification sent");
            ExecutionResult::ok(QUEUE_PREFIX, format!("Sent message to {name}"))
        }
        Err(err) => {
            let message = format!("{err:#}");
            warn!(sink = %name, error = %message, "notification failed");
            ExecutionResult::failed(QUEUE_PREFIX, format!("{message} {name}"))
        }
    }
}

async fn send_json<M>(sink: &dyn NotificationSink, message: &M) -> Result<()>
where
    M: Serialize + ?Sized,
{
    let payload = serde_json::to_string(message).context("serializing notification")?;
    sink.send(payload).await
}

/// Sink that appends one JSON document per line to a local file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl NotificationSink for JsonLinesSink {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn send<'a>(&'a self, payload: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .with_context(|| format!("opening {:?}", self.path))?;

            let mut line = payload.into_bytes();
            line.push(b'\n');
            file.write_all(&line)
                .await
                .with_context(|| format!("appending to {:?}", self.path))?;
            file.flush().await?;
            Ok::<_, anyhow::Error>(())
        })
    }
}
