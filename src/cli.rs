// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `runxfer`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runxfer",
    version,
    about = "Run external programs and move files to and from blob storage.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML), `Runxfer.toml` if omitted. A missing
    /// file means defaults.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNXFER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a program and print its prefixed stdout/stderr.
    Run {
        /// Label prepended to every output line.
        #[arg(long, default_value = "RUN")]
        prefix: String,

        /// Working directory (default: `[process].working_directory`).
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,

        /// Extra environment variable; must not already be set.
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,

        /// Kill the program after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        #[arg(value_name = "PROGRAM")]
        program: String,

        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Download a remote object to a local file, retrying on failure.
    Download {
        #[arg(long, default_value = "DOWNLOAD")]
        prefix: String,

        #[arg(value_name = "URI")]
        uri: String,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Upload a local file as a block blob with 4 parallel workers.
    Upload {
        #[arg(long, default_value = "UPLOAD")]
        prefix: String,

        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "URI")]
        uri: String,
    },

    /// Append a JSON notification to the queue file.
    Notify {
        /// Queue file (default: `[notify].queue_path`).
        #[arg(long, value_name = "PATH")]
        queue: Option<PathBuf>,

        /// Message as a JSON document.
        #[arg(value_name = "JSON")]
        message: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
