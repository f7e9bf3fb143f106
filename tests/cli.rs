//! Process-level behaviour of the gatekeeper binary.

use std::process::{Command, Output};

mod common;

use common::TempConfig;

const PROXY_VARS: [&str; 9] = [
    "PROXY_CONFIG_FILE",
    "PROXY_LISTEN",
    "PROXY_CLIENT_SECRET",
    "PROXY_CLIENT_ID",
    "PROXY_DISCOVERY_URL",
    "PROXY_REDIRECTION_URL",
    "PROXY_REVOCATION_URL",
    "PROXY_STORE_URL",
    "PROXY_UPSTREAM_URL",
];

fn run(args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gatekeeper"));
    for var in PROXY_VARS {
        command.env_remove(var);
    }
    command.args(args).output().unwrap()
}

#[test]
fn test_missing_upstream_exits_with_error() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[error]"), "stderr: {}", stderr);
    assert!(stderr.contains("upstream"), "stderr: {}", stderr);
}

#[test]
fn test_bad_file_exits_with_error() {
    let file = TempConfig::new("json", "{ not json");
    let output = run(&["--config", file.path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(file.path.to_str().unwrap()), "stderr: {}", stderr);
}

#[test]
fn test_bad_key_pair_exits_with_error() {
    let output = run(&[
        "--upstream-url",
        "http://127.0.0.1:8080",
        "--skip-token-verification",
        "--headers",
        "novalue",
    ]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("novalue"), "stderr: {}", stderr);
}
