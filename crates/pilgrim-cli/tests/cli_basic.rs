//! Basic CLI E2E tests.
//!
//! Each test drives the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_pilgrim"))
        .env("PILGRIM_DATA_DIR", data_dir)
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?} printed non-JSON ({e}): {stdout}"))
}

fn accelerated(data_dir: &Path) {
    let (code, _, stderr) = run_cli(data_dir, &["config", "set", "default_mode", "accelerated"]);
    assert_eq!(code, 0, "{stderr}");
}

#[test]
fn test_timer_status_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["phase"], "work");
    assert_eq!(status["remaining_secs"], 1500);
    assert_eq!(status["is_running"], false);
    assert_eq!(status["completed_focus_count"], 0);
}

#[test]
fn test_tick_keeps_remaining_time() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "tick", "--count", "3"]);
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["remaining_secs"], 1497);
    assert_eq!(status["is_running"], false);
}

#[test]
fn test_focus_completion_opens_reflection() {
    let dir = tempfile::tempdir().unwrap();
    accelerated(dir.path());

    let events = run_json(dir.path(), &["timer", "tick", "--count", "5"]);
    let types: Vec<_> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect();
    assert!(types.contains(&"PhaseCompleted".to_string()), "{types:?}");
    assert!(types.contains(&"ReflectionPrompted".to_string()), "{types:?}");

    let journal = run_json(dir.path(), &["journal", "list"]);
    assert_eq!(journal["pending"]["focusCount"], 1);

    let recorded = run_json(
        dir.path(),
        &["journal", "record", "--mood", "peaceful", "--text", "calm walk"],
    );
    assert_eq!(recorded["entry"]["moodTag"], "peaceful");
    assert_eq!(recorded["entry"]["focusCountAtCreation"], 1);
    assert_eq!(recorded["entry"]["environmentId"], "desert");

    // The prompt is gone once answered.
    let (code, _, stderr) = run_cli(dir.path(), &["journal", "dismiss"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["phase"], "short_rest");
    assert_eq!(status["remaining_secs"], 3);
}

#[test]
fn test_locked_environment_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["progress", "environment", "aurora"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("aurora"), "{stderr}");

    let status = run_json(dir.path(), &["progress", "status"]);
    assert_eq!(status["progress"]["activeEnvironmentId"], "desert");
    assert_eq!(status["travelerPosition"], 10.0);
}

#[test]
fn test_catalog_lists_defaults_unlocked() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = run_json(dir.path(), &["progress", "catalog"]);
    let items = catalog.as_array().unwrap();
    assert_eq!(items.len(), 8);
    let desert = items.iter().find(|i| i["id"] == "desert").unwrap();
    assert_eq!(desert["unlocked"], true);
    assert_eq!(desert["active"], true);
    let mountain = items.iter().find(|i| i["id"] == "mountain").unwrap();
    assert_eq!(mountain["unlocked"], false);
}

#[test]
fn test_mode_switch_resets_phase() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "tick", "--count", "2"]);
    run_json(dir.path(), &["timer", "mode", "accelerated"]);
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["mode"], "accelerated");
    assert_eq!(status["remaining_secs"], 5);
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "durations.standard.work"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1500");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "durations.standard.work", "0"]);
    assert_eq!(code, 1);

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "durations.standard.work", "1200"]);
    assert_eq!(code, 0);
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["remaining_secs"], 1200);

    let (code, _, _) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);

    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "list", "--toml"]);
    assert!(stdout.contains("default_mode = \"standard\""), "{stdout}");
}
