// src/exec/output.rs

//! Shared, append-only capture of a child's output streams.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Append-only line log shared by the stdout and stderr readers.
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl OutputLog {
    pub fn push(&self, line: String) {
        match self.lines.lock() {
            Ok(mut guard) => guard.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Spawn a reader that appends every non-empty line of `stream` to `log`,
/// tagged with `tag`.
///
/// Bytes are decoded lossily so a binary or mis-encoded line never stops the
/// reader. The task ends at EOF or on the first read error.
pub fn spawn_line_reader<R>(stream: R, log: OutputLog, tag: String) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    if line.is_empty() {
                        continue;
                    }
                    trace!(tag = %tag, "{}", line);
                    log.push(format!("{tag}{line}"));
                }
                Err(e) => {
                    warn!(tag = %tag, error = %e, "error reading process output");
                    break;
                }
            }
        }
    })
}
