use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use anyhow::anyhow;
use runxfer::notify::NotificationSink;

/// Notification sink that keeps payloads in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every send fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for MemorySink {
    fn name(&self) -> String {
        "memory://queue".to_string()
    }

    fn send<'a>(
        &'a self,
        payload: String,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(msg) = &self.fail_with {
                return Err(anyhow!(msg.clone()));
            }
            self.messages.lock().unwrap().push(payload);
            Ok(())
        })
    }
}
