// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod naming;
pub mod notify;
pub mod result;
pub mod transfer;

use std::time::Duration;

use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, default_config_path, load_or_default};
use crate::errors::{Result, RunxferError};
use crate::exec::{ProcessExecutor, ProcessSpec, TokioProcessExecutor};
use crate::naming::parse_uri;
use crate::notify::{JsonLinesSink, dispatch_message};
use crate::transfer::{TransferEngine, store_for};

pub use crate::result::ExecutionResult;
pub use reqwest::Url;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, validates the command's inputs, then performs exactly
/// one operation. Invalid input (config, environment, URI) is an `Err`;
/// everything that happens once the operation has started is reported
/// through the returned [`ExecutionResult`].
pub async fn run(args: CliArgs) -> Result<ExecutionResult> {
    run_with(args, &TokioProcessExecutor).await
}

/// [`run`] with an explicit process execution capability.
pub async fn run_with(args: CliArgs, executor: &dyn ProcessExecutor) -> Result<ExecutionResult> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_or_default(&config_path)?;
    debug!(config = ?config_path, "configuration loaded");

    match args.command {
        Command::Run {
            prefix,
            cwd,
            env,
            timeout,
            program,
            args,
        } => {
            let mut builder = ProcessSpec::builder(program)
                .args(args)
                .envs(env)
                .working_directory(cwd.unwrap_or_else(|| cfg.process.working_directory.clone()));
            if let Some(limit) = timeout.map(Duration::from_secs).or(cfg.process.timeout()) {
                builder = builder.timeout(limit);
            }
            let spec = builder.build()?;
            Ok(executor.run(&spec, &prefix).await)
        }

        Command::Download { prefix, uri, file } => {
            let uri = require_uri(&uri)?;
            let engine = transfer_engine(&uri, &cfg)?;
            Ok(engine.download_to(&uri, &file, &prefix).await)
        }

        Command::Upload { prefix, file, uri } => {
            let uri = require_uri(&uri)?;
            let engine = transfer_engine(&uri, &cfg)?;
            Ok(engine.upload_to(&file, &uri, &prefix).await)
        }

        Command::Notify { queue, message } => {
            let message: serde_json::Value = serde_json::from_str(&message)?;
            let sink = JsonLinesSink::new(queue.unwrap_or_else(|| cfg.notify.queue_path.clone()));
            Ok(dispatch_message(Some(&sink), &message).await)
        }
    }
}

fn require_uri(s: &str) -> Result<Url> {
    parse_uri(s)?.ok_or_else(|| RunxferError::InvalidUri("URI must not be empty".to_string()))
}

fn transfer_engine(uri: &Url, cfg: &ConfigFile) -> Result<TransferEngine> {
    let store = store_for(uri, &cfg.transfer)?;
    Ok(TransferEngine::new(store).with_block_size(cfg.transfer.block_size))
}
