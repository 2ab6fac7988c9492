// src/transfer/mod.rs

//! Blob transfer layer.
//!
//! - [`retry`] is the download retry policy and the retry loop.
//! - [`store`] defines the `BlobStore` capability and picks an
//!   implementation per URI scheme ([`http`], [`local`]).
//! - [`download`] copies a remote object into a local file with retry.
//! - [`upload`] stages a local file as blocks with 4 concurrent workers and
//!   commits them atomically; it never retries.
//! - [`engine`] bundles a store with the policies into `TransferEngine`.

pub mod download;
pub mod engine;
pub mod http;
pub mod local;
pub mod retry;
pub mod store;
pub mod upload;

use std::path::Path;

pub use download::TransferTarget;
pub use engine::TransferEngine;
pub use http::HttpBlobStore;
pub use local::LocalBlobStore;
pub use retry::{Backoff, RetryPolicy};
pub use store::{BlobStore, ByteStream, StoreFuture, block_id, store_for};
pub use upload::{UPLOAD_PARALLELISM, UploadPlan};

/// Absolute form of `path` for result messages; falls back to `path` as is.
pub(crate) fn full_name(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
