// src/transfer/http.rs

//! Reqwest-based blob store speaking the block-blob REST protocol.
//!
//! - Reads are a plain `GET`, streamed chunk by chunk.
//! - Writes are `PUT ?comp=block&blockid=..` per block followed by one
//!   `PUT ?comp=blocklist` with the ordered block list.
//!
//! Credentials (e.g. a SAS token) travel in the URI query; extra query
//! parameters are appended to it.

use std::time::Duration;

use anyhow::Context;
use futures::StreamExt;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::errors::Result;
use crate::transfer::store::{BlobStore, ByteStream, StoreFuture};

const STORAGE_API_VERSION: &str = "2021-08-06";

#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    http: reqwest::Client,
}

impl HttpBlobStore {
    /// Build a store whose requests time out after `request_timeout`
    /// (`None` = no client-side timeout).
    pub fn new(request_timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }
}

fn with_query(uri: &Url, pairs: &[(&str, &str)]) -> Url {
    let mut url = uri.clone();
    url.query_pairs_mut().extend_pairs(pairs);
    url
}

fn block_list_xml(block_ids: &[String]) -> String {
    let mut body = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
    for id in block_ids {
        body.push_str("<Latest>");
        body.push_str(id);
        body.push_str("</Latest>");
    }
    body.push_str("</BlockList>");
    body
}

impl BlobStore for HttpBlobStore {
    fn open_read<'a>(&'a self, uri: &'a Url) -> StoreFuture<'a, ByteStream> {
        Box::pin(async move {
            let resp = self
                .http
                .get(uri.clone())
                .send()
                .await
                .with_context(|| format!("requesting {uri}"))?
                .error_for_status()?;

            debug!(uri = %uri, content_length = ?resp.content_length(), "download stream opened");

            let stream = resp
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(anyhow::Error::from));
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
            let url = with_query(uri, &[("comp", "block"), ("blockid", block_id)]);
            self.http
                .put(url)
                .header("x-ms-version", STORAGE_API_VERSION)
                .body(data)
                .send()
                .await
                .with_context(|| format!("sending block {block_id}"))?
                .error_for_status()?;
            Ok::<_, anyhow::Error>(())
        })
    }

    fn commit_blocks<'a>(&'a self, uri: &'a Url, block_ids: &'a [String]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let url = with_query(uri, &[("comp", "blocklist")]);
            self.http
                .put(url)
                .header("x-ms-version", STORAGE_API_VERSION)
                .header(CONTENT_TYPE, "application/xml")
                .body(block_list_xml(block_ids))
                .send()
                .await
                .context("sending block list")?
                .error_for_status()?;
            Ok::<_, anyhow::Error>(())
        })
    }
}
