// src/naming.rs

//! File-name helpers for turning blob names into local file names.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::errors::{Result, RunxferError};

// Characters no platform accepts in a file name, plus '%' and ' ' which
// break shell quoting in downstream tools.
static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[<>:"/\\|?*%\x00-\x1F ]"#).expect("static file-name pattern is valid")
});

/// Replace every unsafe character of `name` with `_`.
pub fn safe_file_name(name: &str) -> PathBuf {
    PathBuf::from(UNSAFE_CHARS.replace_all(name, "_").into_owned())
}

pub fn local_file(name: &str) -> PathBuf {
    safe_file_name(name)
}

/// `video.mp4` → `video.stats`
pub fn stats_file(name: &str) -> PathBuf {
    safe_file_name(&name.replace(".mp4", ".stats"))
}

/// `video.mp4` → `video.mmrk`
pub fn mmrk_file(name: &str) -> PathBuf {
    safe_file_name(&name.replace(".mp4", ".mmrk"))
}

/// `video.mp4` → `video-<user_id>.mp4`
pub fn watermark_file_for_user(name: &str, user_id: &str) -> PathBuf {
    safe_file_name(&name.replace(".mp4", &format!("-{user_id}.mp4")))
}

/// Parse an optional URI: empty input is `None`, malformed input an error.
pub fn parse_uri(s: &str) -> Result<Option<Url>> {
    if s.is_empty() {
        return Ok(None);
    }
    Url::parse(s)
        .map(Some)
        .map_err(|e| RunxferError::InvalidUri(format!("{s}: {e}")))
}
