// src/transfer/upload.rs

//! Parallel block upload of a local file.

use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use futures::TryStreamExt;
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info};

use crate::result::ExecutionResult;
use crate::transfer::full_name;
use crate::transfer::store::{BlobStore, block_id};

/// Number of blocks in flight at once.
pub const UPLOAD_PARALLELISM: usize = 4;

/// Default size of one staged block.
pub const DEFAULT_BLOCK_SIZE: u64 = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub file: PathBuf,
    pub destination: Url,
    pub parallelism: usize,
    pub block_size: u64,
}

impl UploadPlan {
    pub fn new(file: impl Into<PathBuf>, destination: Url) -> Self {
        Self {
            file: file.into(),
            destination,
            parallelism: UPLOAD_PARALLELISM,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }
}

/// Split `len` bytes into consecutive ranges of at most `block_size` bytes.
pub fn block_ranges(len: u64, block_size: u64) -> Vec<Range<u64>> {
    if block_size == 0 {
        return Vec::new();
    }
    (0..len.div_ceil(block_size))
        .map(|i| {
            let start = i * block_size;
            start..(start + block_size).min(len)
        })
        .collect()
}

/// Upload `plan.file` to `plan.destination`.
///
/// Blocks are read and staged by up to `plan.parallelism` concurrent
/// workers. The first failing worker fails the whole upload and the
/// remaining workers are dropped; nothing is committed in that case.
/// There is no retry.
pub async fn upload(store: &dyn BlobStore, plan: &UploadPlan, prefix: &str) -> ExecutionResult {
    let uri = &plan.destination;
    match upload_inner(store, plan, prefix).await {
        Ok(blocks) => {
            info!(prefix, uri = %uri, blocks, "upload complete");
            ExecutionResult::ok(
                prefix,
                format!("Uploaded {} to {uri}", full_name(&plan.file)),
            )
        }
        Err(err) => ExecutionResult::failed(prefix, format!("during upload: \"{err:#}\" {uri}")),
    }
}

async fn upload_inner(store: &dyn BlobStore, plan: &UploadPlan, prefix: &str) -> Result<usize> {
    if plan.block_size == 0 {
        bail!("block size must be at least 1 byte");
    }

    let len = tokio::fs::metadata(&plan.file)
        .await
        .with_context(|| format!("reading metadata of {:?}", plan.file))?
        .len();
    let ranges = block_ranges(len, plan.block_size);
    let ids: Vec<String> = (0..ranges.len()).map(block_id).collect();

    info!(
        prefix,
        file = ?plan.file,
        uri = %plan.destination,
        bytes = len,
        blocks = ranges.len(),
        parallelism = plan.parallelism,
        "starting upload"
    );

    futures::stream::iter(ranges.iter().enumerate().map(Ok::<_, anyhow::Error>))
        .try_for_each_concurrent(plan.parallelism.max(1), |(index, range)| {
            let id = &ids[index];
            async move {
                let data = read_range(&plan.file, range).await?;
                store
                    .put_block(&plan.destination, id, data)
                    .await
                    .with_context(|| format!("uploading block {index}"))?;
                debug!(prefix, block = index, "block staged");
                Ok(())
            }
        })
        .await?;

    store
        .commit_blocks(&plan.destination, &ids)
        .await
        .context("committing block list")?;

    Ok(ids.len())
}

async fn read_range(path: &Path, range: &Range<u64>) -> Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {path:?}"))?;
    file.seek(SeekFrom::Start(range.start)).await?;

    let mut buf = vec![0u8; (range.end - range.start) as usize];
    file.read_exact(&mut buf)
        .await
        .with_context(|| format!("reading bytes {}..{} of {path:?}", range.start, range.end))?;
    Ok(buf)
}
