// src/transfer/download.rs

//! Retrying download of a remote object into a local file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::Url;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::result::ExecutionResult;
use crate::transfer::full_name;
use crate::transfer::retry::{RetryPolicy, retry_async};
use crate::transfer::store::BlobStore;

/// What to download and where to put it.
///
/// `label_prefix` only tags log lines and result output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub remote_uri: Url,
    pub local_file: PathBuf,
    pub label_prefix: String,
}

impl TransferTarget {
    pub fn new(
        remote_uri: Url,
        local_file: impl Into<PathBuf>,
        label_prefix: impl Into<String>,
    ) -> Self {
        Self {
            remote_uri,
            local_file: local_file.into(),
            label_prefix: label_prefix.into(),
        }
    }
}

/// Download `target` through `store`, retrying every failure per `policy`.
///
/// Each attempt truncates the local file and copies the full remote stream
/// into it; the file is flushed and closed before the result is returned.
/// On exhaustion only the last attempt's error is reported.
pub async fn download(
    store: &dyn BlobStore,
    policy: &RetryPolicy,
    target: &TransferTarget,
) -> ExecutionResult {
    let prefix = target.label_prefix.as_str();
    let uri = &target.remote_uri;

    info!(
        prefix,
        uri = %uri,
        file = ?target.local_file,
        max_attempts = policy.max_attempts,
        "starting download"
    );

    let outcome = retry_async(policy, prefix, |attempt| download_once(store, target, attempt)).await;

    match outcome {
        Ok(bytes) => {
            info!(prefix, uri = %uri, bytes, "download complete");
            ExecutionResult::ok(
                prefix,
                format!("Downloaded {uri} to {}", full_name(&target.local_file)),
            )
        }
        Err(err) => ExecutionResult::failed(prefix, format!("during download: \"{err:#}\" {uri}")),
    }
}

async fn download_once(store: &dyn BlobStore, target: &TransferTarget, attempt: u32) -> Result<u64> {
    debug!(prefix = %target.label_prefix, attempt, "download attempt");

    let mut stream = store.open_read(&target.remote_uri).await?;

    let path = &target.local_file;
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("creating {path:?}"))?;

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("writing {path:?}"))?;
        written += chunk.len() as u64;
    }
    file.flush().await.with_context(|| format!("flushing {path:?}"))?;

    Ok(written)
}
