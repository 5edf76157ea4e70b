//! CLI Integration Tests
//!
//! These tests run the `samsmart` binary against temporary files. None of
//! them contact the measurement API.
//!
//! ```
//! cargo test --package samsmart-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

/// Run samsmart with the given arguments and no inherited log settings.
fn run_samsmart(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_samsmart"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run samsmart binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

const CONFIG: &str = r#"
[user]
od_session = "secret"

[available_sensors]
Gas = { role = "cardinal", aggregation = "mean" }
Licht = "cardinal"

[households.haushalt1]
timeframes = [
  { tag = "haushalt1", source = "koffer1", oldest_record = "2024-01-01T00:00:00Z", newest_record = "2024-01-10T00:00:00Z" },
]

[households.ssh3]
timeframes = [
  { tag = "ssh3", source = "koffer1", oldest_record = "2024-01-10T00:00:00Z", newest_record = "2024-01-20T00:00:00Z" },
]
"#;

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_lists_commands() {
    let output = run_samsmart(&["--help"]);
    assert!(output.status.success());
    let out = stdout(&output);
    for command in ["check", "fetch", "merge"] {
        assert!(out.contains(command), "help is missing {command}: {out}");
    }
}

#[test]
fn test_version() {
    let output = run_samsmart(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_agg_requires_bin() {
    let output = run_samsmart(&["merge", "a.csv", "--agg", "sum"]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_bin_width_is_rejected() {
    let output = run_samsmart(&["merge", "a.csv", "--bin", "0min"]);
    assert!(!output.status.success());
}

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_merge_without_config_uses_first() {
    let dir = tempfile::tempdir().unwrap();
    let gas = write(
        dir.path(),
        "gas.csv",
        "timestamp,Gas\n2024-01-01T00:00:00Z,1\n2024-01-01T00:00:00Z,3\n",
    );
    let licht = write(dir.path(), "licht.csv", "timestamp,Licht\n2024-01-01T00:00:30Z,200\n");
    // Point the default config lookup at an empty directory.
    let output = Command::new(env!("CARGO_BIN_EXE_samsmart"))
        .args(["merge", &gas, &licht])
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "timestamp,Gas,Licht\n\
         2024-01-01T00:00:00Z,1,\n\
         2024-01-01T00:00:30Z,,200\n"
    );
}

#[test]
fn test_merge_with_config_and_bin_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", CONFIG);
    let gas = write(
        dir.path(),
        "gas.csv",
        "timestamp,Gas\n2024-01-01T00:00:10Z,1\n2024-01-01T00:00:10Z,3\n2024-01-01T00:00:50Z,6\n",
    );
    let out = dir.path().join("merged.csv");

    let output = run_samsmart(&[
        "merge",
        &gas,
        "--config",
        &config,
        "--bin",
        "1min",
        "--agg",
        "sum",
        "-o",
        &out.to_string_lossy(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());
    // Duplicates at 00:00:10 collapse to their mean (2), then the minute sums to 8.
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "timestamp,Gas\n2024-01-01T00:00:00Z,8\n"
    );
}

#[test]
fn test_merge_rejects_wide_csv() {
    let dir = tempfile::tempdir().unwrap();
    let wide = write(dir.path(), "wide.csv", "timestamp,Gas,Licht\n");
    let output = run_samsmart(&["merge", &wide, "-c", &write(dir.path(), "c.toml", CONFIG)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("wide.csv"));
}

#[test]
fn test_merge_duplicate_sensor_fails() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "timestamp,Gas\n2024-01-01T00:00:00Z,1\n");
    let b = write(dir.path(), "b.csv", "timestamp,Gas\n2024-01-01T00:00:01Z,2\n");
    let output = run_samsmart(&["merge", &a, &b, "-c", &write(dir.path(), "c.toml", CONFIG)]);
    assert!(!output.status.success());
}

// =============================================================================
// Check Tests
// =============================================================================

#[test]
fn test_check_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", CONFIG);

    let output = run_samsmart(&["check", "--config", &config]);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Configuration OK"));
    assert!(out.contains("Household haushalt1"));
    assert!(out.contains("Household ssh3"));
    assert!(!out.contains("secret"));
}

#[test]
fn test_check_quiet_prints_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", CONFIG);

    let output = run_samsmart(&["check", "-q", "--config", &config]);
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_check_fails_on_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let overlapping = CONFIG.replace(
        r#"oldest_record = "2024-01-10T00:00:00Z", newest_record = "2024-01-20"#,
        r#"oldest_record = "2024-01-09T00:00:00Z", newest_record = "2024-01-20"#,
    );
    let config = write(dir.path(), "config.toml", &overlapping);

    let output = run_samsmart(&["check", "--config", &config]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("overlap"));
}

#[test]
fn test_check_reports_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "config.toml",
        "[server]\nbase_url = \"ftp://host\"\n[user]\nod_session = \"\"\n",
    );

    let output = run_samsmart(&["check", "--config", &config]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("server.base_url"));
    assert!(err.contains("available_sensors"));
}

#[test]
fn test_fetch_unknown_household() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", CONFIG);

    let output = run_samsmart(&["fetch", "--household", "nowhere", "--config", &config]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("nowhere"));
    assert!(err.contains("haushalt1, ssh3"));
}
