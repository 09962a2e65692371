//! funnel-cli exit status tests.

use std::path::PathBuf;
use std::process::Output;

use tokio::process::Command;
use uuid::Uuid;

mod common;

fn write_config(zf: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("funnel-cli-{}.toml", Uuid::new_v4()));
    let content = format!(
        "[pools]\nzf = [\"{}\"]\n\n[observability]\nlog_level = \"error\"\nmetrics_enabled = false\n",
        zf
    );
    std::fs::write(&path, content).unwrap();
    path
}

async fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_funnel-cli"))
        .args(args)
        .output()
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dispatch_success_exits_zero() {
    let node = common::start_funnel_node(200, 0).await;
    let config = write_config(&node.url());

    let output = run_cli(&[
        "dispatch",
        "--config",
        config.to_str().unwrap(),
        "--endpoint",
        "/student/zf/score",
        "--form",
        "type=ZF",
    ])
    .await;
    let _ = std::fs::remove_file(&config);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("\"code\": 200"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dispatch_error_exits_nonzero() {
    let node = common::start_funnel_node(412, 0).await;
    let config = write_config(&node.url());

    let output = run_cli(&[
        "dispatch",
        "--config",
        config.to_str().unwrap(),
        "--endpoint",
        "/student/zf/score",
        "--form",
        "type=ZF",
    ])
    .await;
    let _ = std::fs::remove_file(&config);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("WrongPassword"));
    assert_eq!(node.calls(), 1);
}

#[tokio::test]
async fn test_admin_command_requires_key() {
    let output = run_cli(&["status"]).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--key is required"));
}
