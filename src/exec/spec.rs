// src/exec/spec.rs

//! Validated description of one process invocation.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, RunxferError};

/// Everything needed to launch one external program.
///
/// Built through [`ProcessSpec::builder`], which rejects malformed input
/// before anything is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    command: String,
    arguments: Vec<String>,
    environment: BTreeMap<String, String>,
    working_directory: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessSpec {
    pub fn builder(command: impl Into<String>) -> ProcessSpecBuilder {
        ProcessSpecBuilder {
            command: command.into(),
            arguments: Vec::new(),
            environment: Vec::new(),
            working_directory: PathBuf::from("."),
            timeout: None,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Variables added on top of the inherited environment.
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Command and arguments joined by single spaces, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builder for [`ProcessSpec`].
#[derive(Debug, Clone)]
pub struct ProcessSpecBuilder {
    command: String,
    arguments: Vec<String>,
    environment: Vec<(String, String)>,
    working_directory: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessSpecBuilder {
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = dir.into();
        self
    }

    /// Kill the process if it has not exited after `limit`.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Validate against the environment of the current process.
    pub fn build(self) -> Result<ProcessSpec> {
        let inherited: Vec<String> = std::env::vars_os()
            .map(|(k, _)| k.to_string_lossy().into_owned())
            .collect();
        self.build_with_inherited(inherited)
    }

    /// Validate against an explicit snapshot of inherited variable names.
    ///
    /// Fails with [`RunxferError::DuplicateEnvKey`] when an additional
    /// variable is given twice or already exists in `inherited_keys`.
    pub fn build_with_inherited<I, K>(self, inherited_keys: I) -> Result<ProcessSpec>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        if self.command.trim().is_empty() {
            return Err(RunxferError::Config(
                "process command must not be empty".to_string(),
            ));
        }

        let inherited: HashSet<String> = inherited_keys
            .into_iter()
            .map(|k| normalize_key(k.as_ref()))
            .collect();

        let mut environment = BTreeMap::new();
        let mut seen = HashSet::new();
        for (key, value) in self.environment {
            if key.is_empty() || key.contains('=') {
                return Err(RunxferError::Config(format!(
                    "invalid environment variable name '{key}'"
                )));
            }
            let normalized = normalize_key(&key);
            if inherited.contains(&normalized) || !seen.insert(normalized) {
                return Err(RunxferError::DuplicateEnvKey(key));
            }
            environment.insert(key, value);
        }

        Ok(ProcessSpec {
            command: self.command,
            arguments: self.arguments,
            environment,
            working_directory: self.working_directory,
            timeout: self.timeout,
        })
    }
}

// Windows environment names are case-insensitive.
fn normalize_key(key: &str) -> String {
    if cfg!(windows) {
        key.to_uppercase()
    } else {
        key.to_string()
    }
}
