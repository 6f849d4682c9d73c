//! Runner behaviour against a real child process, using `sh` as the tool
#![cfg(unix)]

use bytes::Bytes;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use zeorun_core::{FailureKind, ToolArguments};
use zeorun_runner::{RunRequest, Runner, RunnerConfig, SystemProcessExecutor};

fn runner(root: &Path) -> Runner<SystemProcessExecutor> {
    Runner::new(
        SystemProcessExecutor::new("sh"),
        RunnerConfig {
            workspace_root: root.join("work"),
            default_timeout: Duration::from_secs(10),
            max_concurrent_executions: 4,
            cache_max_entries: NonZeroUsize::new(32).unwrap(),
            cache_max_bytes: 1024 * 1024,
        },
    )
    .unwrap()
}

/// `sh -c <script> sh <extra...>` so the script sees `$1`, `$2`, ...
fn script(body: &str, extra: &[&str]) -> ToolArguments {
    let mut args = ToolArguments::from(["-c", body, "sh"]);
    args.extend(extra.iter().copied());
    args
}

fn request(content: &'static [u8], arguments: ToolArguments, outputs: &[&str]) -> RunRequest {
    RunRequest {
        structure: Bytes::from_static(content),
        input_name: "structure.cif".to_string(),
        arguments,
        outputs: outputs.iter().map(|s| (*s).to_string()).collect::<BTreeSet<_>>(),
        operation_id: "pore_diameter".to_string(),
        timeout: None,
    }
}

fn count_runs(counter: &Path) -> usize {
    std::fs::read_to_string(counter)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_first_call_executes_second_is_cached() {
    let temp = TempDir::new().unwrap();
    let counter = temp.path().join("runs");
    let counter_arg = counter.to_string_lossy().to_string();
    let runner = runner(temp.path());

    let args = script(
        r#"echo run >> "$1"; cp structure.cif out.res"#,
        &[&counter_arg],
    );
    let req = request(b"data_X\n", args, &["out.res"]);

    let first = runner.run(req.clone()).await.unwrap();
    assert!(first.success());
    assert!(!first.cached());
    assert_eq!(first.outputs()["out.res"], b"data_X\n".to_vec());

    let second = runner.run(req).await.unwrap();
    assert!(second.cached());
    assert_eq!(second.outputs(), first.outputs());
    assert_eq!(count_runs(&counter), 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_process() {
    let temp = TempDir::new().unwrap();
    let counter = temp.path().join("runs");
    let counter_arg = counter.to_string_lossy().to_string();
    let runner = runner(temp.path());

    let args = script(
        r#"echo run >> "$1"; sleep 0.3; printf 'ok' > out.res"#,
        &[&counter_arg],
    );

    let mut handles = Vec::new();
    for _ in 0..6 {
        let runner = runner.clone();
        let req = request(b"data_Y\n", args.clone(), &["out.res"]);
        handles.push(tokio::spawn(async move { runner.run(req).await }));
    }
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.outputs()["out.res"], b"ok".to_vec());
    }

    assert_eq!(count_runs(&counter), 1);
}

#[tokio::test]
async fn test_failure_is_retried_on_next_request() {
    let temp = TempDir::new().unwrap();
    let counter = temp.path().join("runs");
    let counter_arg = counter.to_string_lossy().to_string();
    let runner = runner(temp.path());

    let args = script(
        r#"echo run >> "$1"; echo 'Error: bad radius' >&2; exit 2"#,
        &[&counter_arg],
    );
    let req = request(b"data_Z\n", args, &["out.res"]);

    for _ in 0..2 {
        let response = runner.run(req.clone()).await.unwrap();
        assert!(!response.success());
        assert!(!response.cached());
        assert_eq!(response.stderr(), "Error: bad radius\n");
        assert_eq!(
            response.result.failure,
            Some(FailureKind::NonZeroExit { exit_code: Some(2) })
        );
    }
    assert_eq!(count_runs(&counter), 2);
}

#[tokio::test]
async fn test_timeout_kills_and_leaves_no_workspace() {
    let temp = TempDir::new().unwrap();
    let runner = runner(temp.path());

    let mut req = request(
        b"data_slow\n",
        script("printf partial > out.res; sleep 30", &[]),
        &["out.res"],
    );
    req.timeout = Some(Duration::from_millis(300));

    let started = std::time::Instant::now();
    let response = runner.run(req).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!response.success());
    assert!(response.outputs().is_empty());
    assert!(matches!(
        response.result.failure,
        Some(FailureKind::Timeout { .. })
    ));
    let leftover = std::fs::read_dir(temp.path().join("work")).unwrap().count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_zero_exit_without_output_is_missing_output() {
    let temp = TempDir::new().unwrap();
    let runner = runner(temp.path());

    let response = runner
        .run(request(b"data_empty\n", script("true", &[]), &["out.res"]))
        .await
        .unwrap();

    assert_eq!(
        response.result.failure,
        Some(FailureKind::MissingOutput {
            file: "out.res".to_string()
        })
    );
    assert!(runner.cache().is_empty());
}
