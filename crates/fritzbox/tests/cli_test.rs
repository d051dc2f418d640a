//! Integration tests for the `fritzbox` CLI binary.
//!
//! Argument parsing, help output, completions, config handling and the
//! errors raised before any request reaches a router.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// `fritzbox` with every `FRITZBOX_*` variable cleared and the config
/// directories pointed somewhere that does not exist.
fn fritzbox_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fritzbox");
    cmd.env("HOME", "/tmp/fritzbox-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fritzbox-cli-test-nonexistent")
        .env_remove("FRITZBOX_CONFIG")
        .env_remove("FRITZBOX_OUTPUT")
        .env_remove("FRITZBOX_HOST")
        .env_remove("FRITZBOX_REMOTE")
        .env_remove("FRITZBOX_USERNAME")
        .env_remove("FRITZBOX_PASSWORD")
        .env_remove("FRITZBOX_REMOTE_USER")
        .env_remove("FRITZBOX_REMOTE_PASSWORD")
        .env_remove("FRITZBOX_LOGGING")
        .env_remove("FRITZBOX_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fritzbox_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    fritzbox_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Fritz!Box")
            .and(predicate::str::contains("ports"))
            .and(predicate::str::contains("tam"))
            .and(predicate::str::contains("stats")),
    );
}

#[test]
fn test_version_flag() {
    fritzbox_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fritzbox"));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    fritzbox_cmd().arg("reboot").assert().code(2);
}

#[test]
fn test_ports_add_rejects_non_numeric_port() {
    fritzbox_cmd()
        .args(["ports", "add", "nas", "http", "80"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    fritzbox_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fritzbox"));
}

#[test]
fn test_completions_zsh() {
    fritzbox_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    fritzbox_cmd()
        .args(["config", "path", "--config", "/tmp/some/where.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/some/where.toml"));
}

#[test]
fn test_config_show_masks_passwords() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "host = \"192.168.178.1\"\npassword = \"hunter2\"\ntimeout = 12\n",
    )
    .unwrap();

    fritzbox_cmd()
        .args(["config", "show", "-C"])
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("192.168.178.1")
                .and(predicate::str::contains("timeout = 12"))
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_show_json() {
    fritzbox_cmd()
        .args(["config", "show", "-o", "json", "--host", "box.lan", "--local"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""host": "box.lan""#));
}

#[test]
fn test_invalid_config_timeout_is_usage_error() {
    fritzbox_cmd()
        .args(["config", "show", "--timeout", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("timeout"));
}

// ── Errors before any request ───────────────────────────────────────

#[test]
fn test_failure_is_written_to_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("fritz.log");

    fritzbox_cmd()
        .args(["--host", "example.myfritz.net", "--logging"])
        .arg(&log)
        .args(["tam", "status"])
        .assert()
        .code(3);

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(
        content.contains("Error: Remote access to 'example.myfritz.net' needs a remote user"),
        "log file: {content:?}"
    );
}

#[test]
fn test_remote_without_credentials_exits_auth() {
    fritzbox_cmd()
        .args(["--host", "example.myfritz.net", "tam", "status"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("example.myfritz.net"));
}
