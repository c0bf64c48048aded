//! Integration tests for apcli
//!
//! These exercise the CLI surface; system-dependent commands tolerate
//! restricted environments the way the rest of the suite does not need to.

use assert_cmd::Command;
use predicates::prelude::*;

fn apcli() -> Command {
    Command::cargo_bin("apcli").unwrap()
}

#[test]
fn test_help() {
    apcli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("access point"));
}

#[test]
fn test_status_runs_without_root() {
    // Status is read-only; on systems without hostapd it must still
    // report (unsupported) rather than fail
    let output = apcli()
        .args(["--state-dir", "/tmp/apctl-test-status", "status"])
        .output()
        .expect("Failed to execute command");

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("/sys/class/net not available") {
            eprintln!("Test skipped: requires system access - {}", stderr);
            return;
        }
        panic!("status failed: {}", stderr);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Supported:"), "Output should report support");
    assert!(stdout.contains("State:"), "Output should report state");
}

#[test]
fn test_clients_requires_enabled_ap() {
    // With a fresh state dir the AP is down, so client discovery must
    // refuse rather than print an empty list
    apcli()
        .args(["--state-dir", "/tmp/apctl-test-clients", "clients"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not enabled"));
}

#[test]
fn test_enable_refuses_without_root() {
    if unsafe { libc::geteuid() } == 0 {
        eprintln!("Test skipped: running as root");
        return;
    }
    apcli()
        .args(["--state-dir", "/tmp/apctl-test-enable", "enable"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("root"));
}
