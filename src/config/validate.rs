// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RunxferError};

/// Largest block a block-blob service accepts.
pub const MAX_BLOCK_SIZE: u64 = 4000 * 1024 * 1024;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RunxferError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.transfer, raw.process, raw.notify))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_transfer(cfg)?;
    validate_process(cfg)?;
    validate_notify(cfg)?;
    Ok(())
}

fn validate_transfer(cfg: &RawConfigFile) -> Result<()> {
    let block_size = cfg.transfer.block_size;
    if block_size == 0 {
        return Err(RunxferError::Config(
            "[transfer].block_size must be >= 1 (got 0)".to_string(),
        ));
    }
    if block_size > MAX_BLOCK_SIZE {
        return Err(RunxferError::Config(format!(
            "[transfer].block_size must be <= {MAX_BLOCK_SIZE} (got {block_size})"
        )));
    }
    Ok(())
}

fn validate_process(cfg: &RawConfigFile) -> Result<()> {
    if cfg.process.working_directory.as_os_str().is_empty() {
        return Err(RunxferError::Config(
            "[process].working_directory must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_notify(cfg: &RawConfigFile) -> Result<()> {
    if cfg.notify.queue_path.as_os_str().is_empty() {
        return Err(RunxferError::Config(
            "[notify].queue_path must not be empty".to_string(),
        ));
    }
    Ok(())
}
