// tests/cli_run.rs

mod common;
use crate::common::{file_url, init_tracing, payload};

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use runxfer::cli::{CliArgs, Command};
use runxfer::config::default_config_path;
use runxfer::errors::RunxferError;
use runxfer::run_with;
use runxfer_test_utils::fake_executor::FakeExecutor;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

/// Build args that point `--config` at a file that does not exist, so
/// defaults are used regardless of the working directory.
fn args(dir: &TempDir, rest: &[&str]) -> CliArgs {
    let config = dir.path().join("absent.toml");
    let mut argv = vec![
        "runxfer".to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    argv.extend(rest.iter().map(|s| s.to_string()));
    CliArgs::parse_from(argv)
}

#[tokio::test]
async fn run_builds_spec_from_arguments() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let executor = FakeExecutor::new();
    let cli = args(
        &dir,
        &[
            "run",
            "--prefix",
            "FFMPEG",
            "--env",
            "RUNXFER_CLI_TEST=1",
            "--timeout",
            "60",
            "ffmpeg",
            "-i",
            "in.mp4",
            "out.mp4",
        ],
    );

    let result = run_with(cli, &executor).await?;

    assert!(result.success());
    assert_eq!(result.output(), "FFMPEG: ran ffmpeg -i in.mp4 out.mp4");

    let executed = executor.executed();
    assert_eq!(executed.len(), 1);
    let spec = &executed[0];
    assert_eq!(spec.arguments(), ["-i", "in.mp4", "out.mp4"]);
    assert_eq!(
        spec.environment().get("RUNXFER_CLI_TEST").map(String::as_str),
        Some("1")
    );
    assert_eq!(spec.timeout(), Some(std::time::Duration::from_secs(60)));
    assert_eq!(spec.working_directory(), PathBuf::from(".").as_path());
    Ok(())
}

#[tokio::test]
async fn run_failure_is_a_result_not_an_error() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let executor = FakeExecutor::failing();
    let result = run_with(args(&dir, &["run", "false"]), &executor).await?;

    assert!(!result.success());
    assert_eq!(result.output(), "RUN: ERR fake failure of false");
    Ok(())
}

#[tokio::test]
async fn run_uses_config_defaults() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Runxfer.toml");
    std::fs::write(
        &config,
        "[process]\nworking_directory = \"/srv/work\"\ntimeout_secs = 12\n",
    )?;

    let executor = FakeExecutor::new();
    let cli = CliArgs::parse_from([
        "runxfer",
        "--config",
        config.to_str().expect("utf-8 temp path"),
        "run",
        "true",
    ]);
    run_with(cli, &executor).await?;

    let spec = &executor.executed()[0];
    assert_eq!(spec.working_directory(), PathBuf::from("/srv/work").as_path());
    assert_eq!(spec.timeout(), Some(std::time::Duration::from_secs(12)));
    Ok(())
}

#[tokio::test]
async fn duplicate_env_is_rejected_before_running() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let executor = FakeExecutor::new();
    let cli = args(
        &dir,
        &["run", "--env", "RUNXFER_X=1", "--env", "RUNXFER_X=2", "true"],
    );

    let err = run_with(cli, &executor).await.unwrap_err();

    assert!(matches!(err, RunxferError::DuplicateEnvKey(ref k) if k == "RUNXFER_X"));
    assert!(executor.executed().is_empty());
    Ok(())
}

#[test]
fn config_path_defaults_to_runxfer_toml() {
    let cli = CliArgs::parse_from(["runxfer", "run", "true"]);
    assert_eq!(cli.config, None);
    assert_eq!(default_config_path(), PathBuf::from("Runxfer.toml"));

    let cli = CliArgs::parse_from(["runxfer", "run", "--config", "other.toml", "true"]);
    assert_eq!(cli.config, Some(PathBuf::from("other.toml")));
}

#[test]
fn malformed_env_pair_is_a_parse_error() {
    let parsed = CliArgs::try_parse_from(["runxfer", "run", "--env", "NOVALUE", "true"]);
    assert!(parsed.is_err());
}

#[test]
fn trailing_arguments_may_start_with_hyphens() {
    let cli = CliArgs::parse_from(["runxfer", "run", "ls", "-la", "--color"]);
    match cli.command {
        Command::Run { program, args, prefix, .. } => {
            assert_eq!(program, "ls");
            assert_eq!(args, vec!["-la", "--color"]);
            assert_eq!(prefix, "RUN");
        }
        other => panic!("expected run, got {other:?}"),
    }
}

#[tokio::test]
async fn download_and_upload_through_file_uris() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let source = dir.path().join("source.mp4");
    let remote = dir.path().join("remote.mp4");
    let copy = dir.path().join("copy.mp4");
    let data = payload(3000);
    std::fs::write(&source, &data)?;
    let uri = file_url(&remote).to_string();
    let executor = FakeExecutor::new();

    let up = run_with(
        args(&dir, &["upload", source.to_str().expect("utf-8"), &uri]),
        &executor,
    )
    .await?;
    assert!(up.success(), "output: {}", up.output());
    assert!(up.output().starts_with("UPLOAD: Uploaded "));

    let down = run_with(
        args(&dir, &["download", &uri, copy.to_str().expect("utf-8")]),
        &executor,
    )
    .await?;
    assert!(down.success(), "output: {}", down.output());
    assert!(down.output().starts_with("DOWNLOAD: Downloaded "));
    assert_eq!(std::fs::read(&copy)?, data);
    Ok(())
}

#[tokio::test]
async fn invalid_uri_is_an_error() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let err = run_with(
        args(&dir, &["download", "not a uri", "out.mp4"]),
        &FakeExecutor::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RunxferError::InvalidUri(_)));

    let err = run_with(
        args(&dir, &["download", "ftp://host/x", "out.mp4"]),
        &FakeExecutor::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RunxferError::UnsupportedScheme(_)));
    Ok(())
}

#[tokio::test]
async fn notify_appends_to_queue_file() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let queue = dir.path().join("q.jsonl");
    let result = run_with(
        args(
            &dir,
            &["notify", "--queue", queue.to_str().expect("utf-8"), r#"{"done":true}"#],
        ),
        &FakeExecutor::new(),
    )
    .await?;

    assert!(result.success());
    assert_eq!(std::fs::read_to_string(&queue)?, "{\"done\":true}\n");
    Ok(())
}

#[tokio::test]
async fn notify_rejects_invalid_json() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let err = run_with(args(&dir, &["notify", "{oops"]), &FakeExecutor::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RunxferError::Json(_)));
    Ok(())
}
