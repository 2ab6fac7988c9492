// src/transfer/engine.rs

//! One store plus the policies that go with it.

use std::path::Path;
use std::sync::Arc;

use reqwest::Url;

use crate::result::ExecutionResult;
use crate::transfer::download::{TransferTarget, download};
use crate::transfer::retry::RetryPolicy;
use crate::transfer::store::BlobStore;
use crate::transfer::upload::{DEFAULT_BLOCK_SIZE, UploadPlan, upload};

/// Download and upload operations bound to one [`BlobStore`].
///
/// Downloads retry per the engine's [`RetryPolicy`] (the fixed 5-attempt
/// exponential policy unless replaced); uploads never retry.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    store: Arc<dyn BlobStore>,
    retry: RetryPolicy,
    block_size: u64,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::download(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn download(&self, target: &TransferTarget) -> ExecutionResult {
        download(self.store.as_ref(), &self.retry, target).await
    }

    pub async fn upload(&self, plan: &UploadPlan, prefix: &str) -> ExecutionResult {
        upload(self.store.as_ref(), plan, prefix).await
    }

    pub async fn download_to(&self, uri: &Url, file: &Path, prefix: &str) -> ExecutionResult {
        self.download(&TransferTarget::new(uri.clone(), file, prefix))
            .await
    }

    /// Upload with the engine's block size and the fixed parallelism.
    pub async fn upload_to(&self, file: &Path, uri: &Url, prefix: &str) -> ExecutionResult {
        let plan = UploadPlan::new(file, uri.clone()).with_block_size(self.block_size);
        self.upload(&plan, prefix).await
    }
}
