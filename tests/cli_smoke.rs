//! CLI smoke tests for the `task-core` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn scaffold() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let services_dir = dir.path().join("services");
    fs::create_dir(&services_dir).unwrap();
    fs::write(
        services_dir.join("svc-a.yaml"),
        "id: svc-a\ntasks:\n  - id: run\n    driver: noop\n    provides: [svc-a.run]\n",
    )
    .unwrap();
    fs::write(dir.path().join("inventory.yaml"), "host-a:\n  role: all\n").unwrap();
    fs::write(dir.path().join("roles.yaml"), "all:\n  services: [svc-a]\n").unwrap();
    dir
}

#[test]
fn runs_a_minimal_graph_successfully() {
    let dir = scaffold();
    Command::cargo_bin("task-core")
        .unwrap()
        .args([
            "-s",
            dir.path().join("services").to_str().unwrap(),
            "-i",
            dir.path().join("inventory.yaml").to_str().unwrap(),
            "-r",
            dir.path().join("roles.yaml").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("succeeded"));
}

#[test]
fn missing_services_dir_is_a_fatal_error() {
    let dir = scaffold();
    Command::cargo_bin("task-core")
        .unwrap()
        .args([
            "-s",
            "/no/such/directory",
            "-i",
            dir.path().join("inventory.yaml").to_str().unwrap(),
            "-r",
            dir.path().join("roles.yaml").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn noop_writes_a_diagram_file() {
    let dir = scaffold();
    let cwd = tempfile::tempdir().unwrap();
    Command::cargo_bin("task-core")
        .unwrap()
        .current_dir(cwd.path())
        .args([
            "-s",
            dir.path().join("services").to_str().unwrap(),
            "-i",
            dir.path().join("inventory.yaml").to_str().unwrap(),
            "-r",
            dir.path().join("roles.yaml").to_str().unwrap(),
            "--noop",
        ])
        .assert()
        .success();
    // dot may not be installed in every environment; the run must succeed
    // either way since an unavailable renderer is non-fatal.
}

#[test]
fn dependency_failure_writes_a_failure_diagram() {
    let dir = tempfile::tempdir().unwrap();
    let services_dir = dir.path().join("services");
    fs::create_dir(&services_dir).unwrap();
    fs::write(
        services_dir.join("svc-a.yaml"),
        "id: svc-a\ntasks:\n  - id: run\n    driver: noop\n    requires: [does-not-exist]\n",
    )
    .unwrap();
    fs::write(dir.path().join("inventory.yaml"), "host-a:\n  role: all\n").unwrap();
    fs::write(dir.path().join("roles.yaml"), "all:\n  services: [svc-a]\n").unwrap();

    let cwd = tempfile::tempdir().unwrap();
    Command::cargo_bin("task-core")
        .unwrap()
        .current_dir(cwd.path())
        .args([
            "-s",
            services_dir.to_str().unwrap(),
            "-i",
            dir.path().join("inventory.yaml").to_str().unwrap(),
            "-r",
            dir.path().join("roles.yaml").to_str().unwrap(),
        ])
        .assert()
        .failure();
    // failure.svg depends on the `dot` binary being on PATH; an unavailable
    // renderer is non-fatal, so its presence isn't asserted here.
}
