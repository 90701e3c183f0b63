//! Runs the binary against a throwaway store directory.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::Path;
use tempfile::{TempDir, tempdir};

fn workspace() -> TempDir {
    tempdir().expect("tempdir")
}

fn vaultplayctl(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vaultplayctl");
    cmd.current_dir(dir)
        .env("VAULTPLAY_STORAGE_ROOT", dir.join("store"))
        .env_remove("VAULTPLAY_CONFIG_PATH")
        .env_remove("VAULTPLAY_CONFIG_JSON")
        .env_remove("VAULTPLAY_PREVIEW_LIMIT")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn grant_changes_the_gate_decision() {
    let dir = workspace();

    vaultplayctl(dir.path())
        .args(["access", "night-shift", "s01e07", "--premium"])
        .assert()
        .success()
        .stdout("preview\n");

    vaultplayctl(dir.path())
        .args(["access", "night-shift", "s01e07", "--premium", "--elapsed", "30s"])
        .assert()
        .success()
        .stdout("blocked\n");

    vaultplayctl(dir.path())
        .args(["entitlement", "grant", "--plan", "access"])
        .assert()
        .success()
        .stdout(predicate::str::contains("subscription active (Access)"));

    vaultplayctl(dir.path())
        .args(["access", "night-shift", "s01e07", "--premium", "--elapsed", "30s"])
        .assert()
        .success()
        .stdout("allowed\n");

    vaultplayctl(dir.path())
        .args(["entitlement", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hasActiveSubscription\": true"));
}

#[test]
fn unlock_is_per_title() {
    let dir = workspace();

    vaultplayctl(dir.path())
        .args(["entitlement", "unlock", "night-shift", "s01e07"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unlocked night-shift:s01e07"));

    vaultplayctl(dir.path())
        .args(["access", "night-shift", "s01e07", "--premium", "--elapsed", "1m"])
        .assert()
        .success()
        .stdout("allowed\n");

    vaultplayctl(dir.path())
        .args(["access", "night-shift", "s01e08", "--premium", "--elapsed", "1m"])
        .assert()
        .success()
        .stdout("blocked\n");
}

#[test]
fn single_title_plan_cannot_be_granted_globally() {
    let dir = workspace();
    vaultplayctl(dir.path())
        .args(["entitlement", "grant", "--plan", "single-title"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entitlement unlock"));
}

#[test]
fn simulation_gates_premium_preview() {
    let dir = workspace();
    vaultplayctl(dir.path())
        .args(["--memory", "simulate", "night-shift", "s01e07", "--premium", "--watch", "45s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("play: preview"))
        .stdout(predicate::str::contains("playing -> gated at 0:29"))
        .stdout(predicate::str::contains("gate: choose a plan (access, inner-circle, single-title)"))
        .stdout(predicate::str::contains("final: gated"));
}

#[test]
fn simulated_purchase_resumes_playback() {
    let dir = workspace();
    vaultplayctl(dir.path())
        .args([
            "--memory",
            "simulate",
            "night-shift",
            "s01e07",
            "--premium",
            "--watch",
            "45s",
            "--buy",
            "inner-circle",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("purchased Inner Circle"))
        .stdout(predicate::str::contains("play: allowed"))
        .stdout(predicate::str::contains("final: playing"));
}

#[test]
fn persisted_simulation_records_progress() {
    let dir = workspace();

    vaultplayctl(dir.path())
        .args(["progress", "list"])
        .assert()
        .success()
        .stdout("no progress recorded\n");

    vaultplayctl(dir.path())
        .args(["simulate", "night-shift", "s01e01", "--watch", "42s", "--persist"])
        .assert()
        .success();

    vaultplayctl(dir.path())
        .args(["progress", "show", "night-shift", "s01e01"])
        .assert()
        .success()
        .stdout("night-shift:s01e01 0:42\n");

    vaultplayctl(dir.path())
        .args(["simulate", "night-shift", "s01e01", "--watch", "1s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("resuming at 0:42"));

    vaultplayctl(dir.path())
        .args(["progress", "clear", "night-shift", "s01e01"])
        .assert()
        .success()
        .stdout("cleared night-shift:s01e01\n");

    vaultplayctl(dir.path())
        .args(["progress", "list"])
        .assert()
        .success()
        .stdout("no progress recorded\n");
}
