// src/transfer/store.rs

//! Blob store capability.
//!
//! The transfer engine talks to a `BlobStore` instead of a concrete HTTP
//! client, so tests can hand it an in-memory fake and the CLI can pick an
//! implementation from the URI scheme.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use futures::Stream;
use reqwest::Url;

use crate::config::TransferConfig;
use crate::errors::RunxferError;
use crate::transfer::http::HttpBlobStore;
use crate::transfer::local::LocalBlobStore;

/// Full byte stream of one remote object, in order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Boxed future returned by [`BlobStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Remote object storage addressed by URI.
///
/// Reads are whole-object streams. Writes follow a block protocol: blocks
/// are staged independently (possibly concurrently) and only become visible
/// at `uri` once [`BlobStore::commit_blocks`] succeeds.
pub trait BlobStore: Send + Sync + Debug {
    /// Open the object at `uri` for a single sequential read.
    fn open_read<'a>(&'a self, uri: &'a Url) -> StoreFuture<'a, ByteStream>;

    /// Stage one block of the object at `uri`.
    fn put_block<'a>(&'a self, uri: &'a Url, block_id: &'a str, data: Vec<u8>)
    -> StoreFuture<'a, ()>;

    /// Publish the staged blocks, in the given order, as the object at `uri`.
    fn commit_blocks<'a>(&'a self, uri: &'a Url, block_ids: &'a [String]) -> StoreFuture<'a, ()>;
}

/// Identifier of the block at `index`.
///
/// All ids of one object have the same length and only use characters of
/// the base64 alphabet, which block-blob services require.
pub fn block_id(index: usize) -> String {
    format!("{index:032x}")
}

/// Pick a store implementation for `uri` based on its scheme.
pub fn store_for(uri: &Url, cfg: &TransferConfig) -> crate::errors::Result<Arc<dyn BlobStore>> {
    match uri.scheme() {
        "http" | "https" => Ok(Arc::new(HttpBlobStore::new(cfg.request_timeout())?)),
        "file" => Ok(Arc::new(LocalBlobStore)),
        other => Err(RunxferError::UnsupportedScheme(other.to_string())),
    }
}
