//! Runs the `sdl-monitor` binary end to end.
//!
//! Only paths that never reach S3 are exercised here; the audit store is
//! covered with in-memory fakes in the other suites.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

const MONITOR_VARS: &[&str] = &[
    "TEAMS_WEBHOOK_URL",
    "MONITOR_S3",
    "MONITOR_DATABASE",
    "MONITOR_TABLE",
    "MONITOR_WEBHOOK_TIMEOUT_SECS",
    "S3_ENDPOINT",
    "S3_PATH_STYLE",
    "LOG_LEVEL",
    "LOG_OUTPUT",
    "LOG_FORMAT",
    "LOG_FILTER",
];

fn monitor() -> Command {
    let mut cmd = Command::cargo_bin("sdl-monitor").unwrap();
    for name in MONITOR_VARS {
        cmd.env_remove(name);
    }
    cmd.env("AWS_REGION", "eu-west-1")
        .env("AWS_ACCESS_KEY_ID", "test")
        .env("AWS_SECRET_ACCESS_KEY", "test")
        .env("AWS_EC2_METADATA_DISABLED", "true");
    cmd
}

#[test]
fn test_missing_configuration_fails_startup() {
    monitor()
        .write_stdin(r#"{"Records": []}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("TEAMS_WEBHOOK_URL"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_without_records_returns_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let assert = monitor()
        .env("TEAMS_WEBHOOK_URL", server.uri())
        .env("MONITOR_S3", "monitor-logs")
        .env("MONITOR_DATABASE", "ops")
        .env("MONITOR_TABLE", "events")
        .args(["--invocation-id", "cli-test"])
        .write_stdin(r#"{"detail": {"state": "FAILED"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"statusCode\":400"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let response: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(response["statusCode"], 400);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[test]
fn test_invalid_event_json_fails() {
    monitor()
        .env("TEAMS_WEBHOOK_URL", "https://hooks.example.com/x")
        .env("MONITOR_S3", "monitor-logs")
        .env("MONITOR_DATABASE", "ops")
        .env("MONITOR_TABLE", "events")
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}
