//! Integration tests for the `medsync` CLI binary.
//!
//! Every test runs against the built-in demo network or a temp seed, with
//! config directories pointed at a nonexistent path.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `medsync` binary with env isolation.
fn medsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("medsync");
    cmd.env("HOME", "/tmp/medsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/medsync-cli-test-nonexistent")
        .env_remove("MEDSYNC_CONFIG")
        .env_remove("MEDSYNC_SEED")
        .env_remove("MEDSYNC_OUTPUT")
        .env_remove("MEDSYNC_ENGINE__SETTLE_DELAY_MS")
        .env_remove("MEDSYNC_ENGINE__SIMULATOR_PERIOD_MS")
        .env_remove("MEDSYNC_ENGINE__DEPLETION_PROBABILITY")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = medsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_flag() {
    medsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("medical-supply")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("simulate"))
            .and(predicate::str::contains("replay")),
    );
}

#[test]
fn test_version_flag() {
    medsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("medsync"));
}

#[test]
fn test_invalid_subcommand() {
    medsync_cmd()
        .arg("teleport")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_completions_bash() {
    medsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("medsync"));
}

// ── Read-only views ─────────────────────────────────────────────────

#[test]
fn test_status_json_for_one_facility() {
    let output = medsync_cmd()
        .args(["status", "--facility", "h1", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines = stdout_json(&output);
    let lines = lines.as_array().unwrap();
    assert_eq!(lines.len(), 6);
    assert!(
        lines
            .iter()
            .all(|l| l["facility"] == "Indonesian Hospital")
    );

    let oxygen = lines.iter().find(|l| l["category"] == "oxygen").unwrap();
    assert_eq!(oxygen["quantity"], 60);
    assert_eq!(oxygen["runway_days"], 7.5);
    assert_eq!(oxygen["status"], "adequate");
}

#[test]
fn test_status_unknown_facility_is_not_found() {
    medsync_cmd()
        .args(["status", "--facility", "h42"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("h42"));
}

#[test]
fn test_status_filters_by_category_and_level() {
    let output = medsync_cmd()
        .args(["status", "--category", "oxygen", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let lines = stdout_json(&output);
    let lines = lines.as_array().unwrap();
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|l| l["category"] == "oxygen"));

    let output = medsync_cmd()
        .args(["status", "--facility", "h1", "--status", "adequate", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let lines = stdout_json(&output);
    let lines = lines.as_array().unwrap();
    assert!(lines.iter().any(|l| l["category"] == "oxygen"));
    assert!(lines.iter().all(|l| l["status"] == "adequate"));
}

#[test]
fn test_status_unknown_category() {
    medsync_cmd()
        .args(["status", "--category", "plasma"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("insulin"));
}

#[test]
fn test_census_sorted_json() {
    let output = medsync_cmd()
        .args(["census", "--sorted", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let totals = stdout_json(&output);
    let totals = totals.as_array().unwrap();
    assert_eq!(totals.len(), 7);
    assert_eq!(totals[0]["date"], "2024-03-01");
    assert_eq!(totals[6]["date"], "2024-03-07");
}

#[test]
fn test_trend_unknown_category() {
    medsync_cmd()
        .args(["trend", "plasma"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("oxygen"));
}

#[test]
fn test_trend_oxygen_json() {
    let output = medsync_cmd()
        .args(["trend", "oxygen", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output).as_array().unwrap().len(), 7);
}

#[test]
fn test_brief_is_json() {
    let output = medsync_cmd().arg("brief").output().unwrap();
    assert!(output.status.success());

    let brief = stdout_json(&output);
    assert_eq!(brief[0]["name"], "Indonesian Hospital");
    assert!(brief[0]["departments"][0]["supplies"][0]["daysSupply"].is_string());
}

#[test]
fn test_invalid_seed_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("broken.json");
    write(&seed, "{ not json");

    medsync_cmd()
        .args(["status", "--seed"])
        .arg(&seed)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("broken.json"));
}

// ── Engine-driven commands ──────────────────────────────────────────

#[test]
fn test_replay_offline_session_syncs() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("session.json");
    write(
        &script,
        r#"[
            {"command": {"type": "set_context", "context": "field"}},
            {"command": {"type": "set_connectivity", "online": false}},
            {"command": {"type": "record_stock", "facility_id": "h1",
                         "department_id": "d1", "item_id": "i2", "delta": -5}},
            {"command": {"type": "record_stock", "facility_id": "h1",
                         "department_id": "d1", "item_id": "i3", "delta": -40}},
            {"command": {"type": "record_stock", "facility_id": "h9",
                         "department_id": "d1", "item_id": "i1", "delta": -1}},
            {"command": {"type": "set_connectivity", "online": true}},
            {"wait_ms": 300}
        ]"#,
    );

    let output = medsync_cmd()
        .env("MEDSYNC_ENGINE__SETTLE_DELAY_MS", "10")
        .args(["replay", "-o", "json"])
        .arg(&script)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report = stdout_json(&output);
    assert_eq!(report["pending"], 0);
    let results = report["results"].as_array().unwrap();
    assert_eq!(results[2]["quantity"], 55);
    assert_eq!(results[3]["quantity"], 210);
    assert_eq!(results[4]["result"], "unresolved");
    assert_eq!(report["log"][0]["message"], "Synced 2 offline records.");
}

#[test]
fn test_replay_rejects_malformed_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("bad.json");
    write(&script, r#"[{"command": {"type": "launch"}}]"#);

    medsync_cmd()
        .arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_simulate_json_log() {
    let output = medsync_cmd()
        .env("MEDSYNC_ENGINE__SIMULATOR_PERIOD_MS", "10")
        .env("MEDSYNC_ENGINE__DEPLETION_PROBABILITY", "1.0")
        .args(["simulate", "--duration", "100ms", "--rng-seed", "7", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let log = stdout_json(&output);
    let log = log.as_array().unwrap();
    assert_eq!(
        log.last().unwrap()["message"],
        "Initial network sync complete."
    );
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_init_show_and_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("medsync.toml");

    medsync_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("medsync.toml"));
    assert!(path.exists());

    medsync_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nested"));

    let output = medsync_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown = stdout_json(&output);
    assert_eq!(shown["engine"]["settle_delay_ms"], 1500);
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medsync.toml");
    write(&path, "[defaults]\noutput = \"json\"\n");

    medsync_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .failure()
        .code(6);

    medsync_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "init", "--force"])
        .assert()
        .success();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("output = \"table\""));
}

#[test]
fn test_config_output_default_applies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medsync.toml");
    write(&path, "[defaults]\noutput = \"json\"\n");

    let output = medsync_cmd()
        .arg("--config")
        .arg(&path)
        .arg("census")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout_json(&output).is_array());
}
