//! CLI integration tests

use std::process::Command;

fn bfm() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bfm"))
}

#[test]
fn test_cli_help() {
    let output = bfm().arg("--help").output().expect("Failed to execute bfm");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Base Fee Monitor"), "Should show app name");
    assert!(stdout.contains("evaluate"), "Should show evaluate command");
    assert!(stdout.contains("sample"), "Should show sample command");
    assert!(stdout.contains("status"), "Should show status command");
}

#[test]
fn test_cli_version() {
    let output = bfm().arg("--version").output().expect("Failed to execute bfm");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("bfm"));
}

#[test]
fn test_evaluate_triggered_json() {
    let output = bfm()
        .args(["evaluate", "102", "100", "--format", "json"])
        .output()
        .expect("Failed to execute bfm");

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["should_respond"], true);
    assert_eq!(report["payload"], "Basefee flux >1.5%");
    assert_eq!(report["decision"]["kind"], "triggered");
    assert_eq!(report["decision"]["flux"]["threshold"], "1");
}

#[test]
fn test_evaluate_boundary_is_stable() {
    let output = bfm()
        .args(["evaluate", "101", "100", "--format", "json"])
        .output()
        .expect("Failed to execute bfm");

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["should_respond"], false);
    assert_eq!(report["payload"], "Stable basefee");
}

#[test]
fn test_evaluate_accepts_hex() {
    let output = bfm()
        .args(["evaluate", "0x3b9aca00", "0x3b9aca00", "--format", "json"])
        .output()
        .expect("Failed to execute bfm");

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["decision"]["flux"]["current"], "1000000000");
}

#[test]
fn test_fail_on_trigger_exit_code() {
    let status = bfm()
        .args(["evaluate", "5", "0", "--fail-on-trigger"])
        .status()
        .expect("Failed to execute bfm");

    assert_eq!(status.code(), Some(3));
}

#[test]
fn test_evaluate_rejects_negative_values() {
    let output = bfm()
        .args(["evaluate", "--", "-1", "100"])
        .output()
        .expect("Failed to execute bfm");

    assert!(!output.status.success());
}
