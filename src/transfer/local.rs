// src/transfer/local.rs

//! Blob store over `file://` URIs.
//!
//! Blocks are staged in a hidden `.<name>.blocks/` directory next to the
//! destination. Committing concatenates them into a temporary file and
//! renames it over the destination, so readers never see a partial object.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::transfer::store::{BlobStore, ByteStream, StoreFuture};

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBlobStore;

fn local_path(uri: &Url) -> Result<PathBuf> {
    uri.to_file_path()
        .map_err(|_| anyhow!("not a local file URI: {uri}"))
}

fn sibling(path: &Path, suffix: &str) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("destination has no file name: {path:?}"))?;
    Ok(path.with_file_name(format!(".{}.{suffix}", name.to_string_lossy())))
}

impl BlobStore for LocalBlobStore {
    fn open_read<'a>(&'a self, uri: &'a Url) -> StoreFuture<'a, ByteStream> {
        Box::pin(async move {
            let path = local_path(uri)?;
            let file = fs::File::open(&path)
                .await
                .with_context(|| format!("opening {path:?}"))?;

            let stream = futures::stream::try_unfold(file, |mut file| async move {
                let mut buf = vec![0u8; READ_CHUNK];
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    return Ok::<_, anyhow::Error>(None);
                }
                buf.truncate(n);
                Ok(Some((buf, file)))
            });
            Ok::<_, anyhow::Error>(Box::pin(stream) as ByteStream)
        })
    }

    fn put_block<'a>(
        &'a self,
        uri: &'a Url,
        block_id: &'a str,
        data: Vec<u8>,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let staging = sibling(&local_path(uri)?, "blocks")?;
            fs::create_dir_all(&staging)
                .await
                .with_context(|| format!("creating staging dir {staging:?}"))?;
            let block_path = staging.join(block_id);
            fs::write(&block_path, &data)
                .await
                .with_context(|| format!("writing block {block_path:?}"))?;
            Ok::<_, anyhow::Error>(())
        })
    }

    fn commit_blocks<'a>(&'a self, uri: &'a Url, block_ids: &'a [String]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let dest = local_path(uri)?;
            let staging = sibling(&dest, "blocks")?;
            let partial = sibling(&dest, "partial")?;

            let mut out = fs::File::create(&partial)
                .await
                .with_context(|| format!("creating {partial:?}"))?;
            for id in block_ids {
                let block = fs::read(staging.join(id))
                    .await
                    .with_context(|| format!("reading staged block {id}"))?;
                out.write_all(&block).await?;
            }
            out.flush().await?;
            out.sync_all().await?;
            drop(out);

            fs::rename(&partial, &dest)
                .await
                .with_context(|| format!("publishing {dest:?}"))?;
            debug!(dest = ?dest, blocks = block_ids.len(), "block list committed");

            if let Err(e) = fs::remove_dir_all(&staging).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(staging = ?staging, error = %e, "failed to clean up staged blocks");
                }
            }
            Ok::<_, anyhow::Error>(())
        })
    }
}
