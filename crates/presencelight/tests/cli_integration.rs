//! Integration tests for the `presencelight` binary.
//!
//! These tests exercise the binary via `assert_cmd`. Every test points
//! `--config` at a temp file so the user's real config is never touched,
//! and none of them needs an indicator attached.

use std::path::PathBuf;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("presencelight")
}

/// Helper: temp dir with a config file containing `contents`.
fn config_with(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("presencelight"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_unknown_subcommand_fails() {
    cli().arg("blink").assert().failure();
}

// ── config ──

#[test]
fn cli_config_json_produces_valid_json() {
    let (_dir, path) = config_with("serial_port = 2\n\n[colors]\nbusy = \"#FF0000\"\n");
    let output = cli()
        .args(["--json", "--config"])
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("config --json should produce valid JSON");
    assert_eq!(json["config_file_exists"], true);
    assert_eq!(json["settings"]["serial_port"], 2);
    assert_eq!(json["palette"]["busy"], "#FF0000");
    assert_eq!(json["palette"]["free"], "#006400");
    assert!(json["problems"].as_array().unwrap().is_empty());
}

#[test]
fn cli_config_reports_problems() {
    let (_dir, path) = config_with("[colors]\nlunch = \"red\"\n");
    cli()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown color key \"lunch\""));
}

#[test]
fn cli_config_set_port_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    cli()
        .arg("--config")
        .arg(&path)
        .args(["config", "--set-port", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("serial_port set to 3"));

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("# PresenceLight configuration"));
    assert!(contents.contains("serial_port = 3"));
}

// ── --verbose flag ──

#[test]
fn cli_verbose_flag_accepted() {
    let (_dir, path) = config_with("");
    cli()
        .arg("-v")
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success();
}

// ── set ──

#[test]
fn cli_set_without_port_fails_cleanly() {
    let (_dir, path) = config_with("serial_port = 0\n");
    cli()
        .arg("--config")
        .arg(&path)
        .args(["set", "busy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: No serial port configured"));
}

#[test]
fn cli_set_missing_device_fails_cleanly() {
    let (_dir, path) = config_with("port_path = \"/nonexistent/presencelight-test\"\n");
    cli()
        .arg("--config")
        .arg(&path)
        .args(["set", "#00FF00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open serial port"));
}

#[test]
fn cli_set_bad_color_fails() {
    let (_dir, path) = config_with("serial_port = 1\n");
    cli()
        .arg("--config")
        .arg(&path)
        .args(["set", "mauve-ish"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Color error"));
}

// ── ports ──

#[test]
fn cli_ports_help_succeeds() {
    cli()
        .args(["ports", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("serial ports"));
}

// ── run ──

#[test]
fn cli_run_console_session_without_device() {
    let (_dir, path) = config_with("notifications_enabled = false\n");
    let output = cli()
        .arg("--json")
        .arg("--config")
        .arg(&path)
        .args(["run", "--no-presence"])
        .write_stdin("busy\nnonsense\nquit\n")
        .timeout(Duration::from_secs(30))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let status: serde_json::Value =
        serde_json::from_slice(&output).expect("run --json should print the final status");
    assert_eq!(status["mode"], "manual");
    assert_eq!(status["link"], "closed");
    assert!(status["port"].is_null());
    assert_eq!(status["color"]["r"], 139);
    assert!(status["confirmed"].is_null());
}

#[test]
fn cli_run_stops_on_stdin_eof() {
    let (_dir, path) = config_with("notifications_enabled = false\n");
    cli()
        .arg("--config")
        .arg(&path)
        .arg("run")
        .write_stdin("")
        .timeout(Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode:"));
}
