//! End-to-end checks of the pipeline contract through the CLI.
//!
//! These tests exercise the parts of the contract that do not need a Docker
//! daemon or registry: trigger evaluation, the dry-run plan, state
//! inspection and recipe validation. Fixtures are real git repositories
//! created with the git CLI; tests skip silently when git is unavailable.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

use amcrest2mqtt_release::recipe::ImageRecipe;

fn git_available() -> bool {
    which::which("git").is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "tester")
        .env("GIT_AUTHOR_EMAIL", "tester@example.com")
        .env("GIT_COMMITTER_NAME", "tester")
        .env("GIT_COMMITTER_EMAIL", "tester@example.com")
        .output()
        .expect("failed to run git");
    assert!(status.status.success(), "git {:?} failed", args);
}

/// Create a repository on `main` with a VERSION file, a contract-conforming
/// Dockerfile and one commit with the given message.
fn release_fixture(commit_message: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path();

    git(path, &["init", "--initial-branch=main"]);
    std::fs::write(path.join("VERSION"), "1.0.34\n").unwrap();
    std::fs::write(path.join("Dockerfile"), ImageRecipe::default().render()).unwrap();
    std::fs::create_dir(path.join("src")).unwrap();
    std::fs::write(path.join("src/amcrest2mqtt.py"), "print('bridge')\n").unwrap();
    std::fs::write(path.join("requirements.txt"), "paho-mqtt\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", commit_message]);

    dir
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("amcrest2mqtt-release").unwrap();
    cmd.env_remove("DOCKER_USERNAME")
        .env_remove("DOCKER_PASSWORD")
        .env_remove("DOCKER_REGISTRY");
    cmd
}

#[test]
fn skip_marker_suppresses_the_release() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let repo = release_fixture("docs tweak [skip ci]");

    cli()
        .args(["--repo"])
        .arg(repo.path())
        .args(["release", "--image", "example/amcrest2mqtt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Release skipped"));

    // A suppressed run creates no state
    assert!(!repo.path().join(".amcrest2mqtt-release.json").exists());
}

#[test]
fn dry_run_plans_both_tags_and_the_full_matrix() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let repo = release_fixture("add doorbell sensor");

    cli()
        .args(["--repo"])
        .arg(repo.path())
        .args(["release", "--dry-run", "--image", "example/amcrest2mqtt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.0.34 → 1.0.35"))
        .stdout(predicate::str::contains("example/amcrest2mqtt:latest"))
        .stdout(predicate::str::contains("example/amcrest2mqtt:1.0.35"))
        .stdout(predicate::str::contains("linux/ppc64le"));

    // Dry run mutates nothing
    let version = std::fs::read_to_string(repo.path().join("VERSION")).unwrap();
    assert_eq!(version, "1.0.34\n");
}

#[test]
fn release_from_non_main_branch_is_skipped() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let repo = release_fixture("feature work");
    git(repo.path(), &["checkout", "-b", "develop"]);

    cli()
        .args(["--repo"])
        .arg(repo.path())
        .args(["release", "--image", "example/amcrest2mqtt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Release skipped"));
}

#[test]
fn preview_reports_trigger_and_recipe() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let repo = release_fixture("add doorbell sensor");

    cli()
        .args(["--repo"])
        .arg(repo.path())
        .args(["preview", "--image", "example/amcrest2mqtt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would run"))
        .stdout(predicate::str::contains("honors the image contract"));
}

#[test]
fn preview_flags_a_broken_recipe() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let repo = release_fixture("add doorbell sensor");
    // Break the entry command contract
    let dockerfile = repo.path().join("Dockerfile");
    let broken = std::fs::read_to_string(&dockerfile)
        .unwrap()
        .replace("/app/amcrest2mqtt.py", "/app/other.py");
    std::fs::write(&dockerfile, broken).unwrap();

    cli()
        .args(["--repo"])
        .arg(repo.path())
        .args(["preview", "--image", "example/amcrest2mqtt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entry command"));
}

#[test]
fn status_without_state_reports_nothing_to_show() {
    let dir = TempDir::new().unwrap();

    cli()
        .args(["--repo"])
        .arg(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No pipeline state"));
}

#[test]
fn status_json_without_state_is_machine_readable() {
    let dir = TempDir::new().unwrap();

    cli()
        .args(["--repo"])
        .arg(dir.path())
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no_pipeline_state"));
}

#[test]
fn cleanup_without_state_succeeds() {
    let dir = TempDir::new().unwrap();

    cli()
        .args(["--repo"])
        .arg(dir.path())
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("No pipeline state to clean up"));
}

#[test]
fn missing_image_and_credentials_is_rejected() {
    let dir = TempDir::new().unwrap();

    cli()
        .args(["--repo"])
        .arg(dir.path())
        .arg("preview")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid arguments"));
}
