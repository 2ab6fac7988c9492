// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::transfer::upload::DEFAULT_BLOCK_SIZE;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [transfer]
/// block_size = 4194304
/// request_timeout_secs = 300
///
/// [process]
/// working_directory = "."
/// timeout_secs = 0
///
/// [notify]
/// queue_path = "notifications.jsonl"
/// ```
///
/// All sections are optional and have reasonable defaults. The download
/// retry policy and the upload parallelism are fixed and cannot be set here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub process: ProcessConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Validated configuration; build it with `ConfigFile::try_from(raw)` or
/// through the loader.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub transfer: TransferConfig,
    pub process: ProcessConfig,
    pub notify: NotifyConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        transfer: TransferConfig,
        process: ProcessConfig,
        notify: NotifyConfig,
    ) -> Self {
        Self {
            transfer,
            process,
            notify,
        }
    }
}

/// `[transfer]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Size in bytes of one uploaded block.
    #[serde(default = "default_block_size")]
    pub block_size: u64,

    /// HTTP client timeout per request; `0` disables it.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TransferConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

fn default_block_size() -> u64 {
    DEFAULT_BLOCK_SIZE
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// `[process]` section: defaults for `runxfer run`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessConfig {
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,

    /// Kill processes after this many seconds; `0` lets them run to
    /// completion.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl ProcessConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_working_directory() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            working_directory: default_working_directory(),
            timeout_secs: 0,
        }
    }
}

/// `[notify]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// File that `runxfer notify` appends JSON lines to.
    #[serde(default = "default_queue_path")]
    pub queue_path: PathBuf,
}

fn default_queue_path() -> PathBuf {
    PathBuf::from("notifications.jsonl")
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            queue_path: default_queue_path(),
        }
    }
}
