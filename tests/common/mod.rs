#![allow(dead_code)]

use std::path::Path;

use runxfer::Url;

pub use runxfer_test_utils::init_tracing;

/// `file://` URL for an absolute `path`.
pub fn file_url(path: &Path) -> Url {
    Url::from_file_path(path).expect("test paths are absolute")
}

/// Deterministic, non-repeating-ish test payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
