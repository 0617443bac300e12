// tests/integration_test.rs
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn bump_release() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bump-release"));
    // Keep the host CI settings out of the child process
    cmd.env_remove("CI")
        .env_remove("GITHUB_ACTOR")
        .env_remove("GITHUB_ACTOR_ID");
    cmd
}

#[test]
fn test_bump_release_help() {
    let output = bump_release()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("bump-release"));
    assert!(stdout.contains("Bump the project version"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_bump_release_version() {
    let output = bump_release()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_component_is_usage_error() {
    let output = bump_release()
        .arg("build")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("major"));
    assert!(stderr.contains("rc"));
}

#[test]
fn test_dry_run_leaves_workspace_untouched() {
    let dir = TempDir::new().unwrap();
    let manifest = "[workspace.package]\nversion = \"2.0.0-rc3\" # auto\n";
    fs::write(dir.path().join("Cargo.toml"), manifest).unwrap();

    let output = bump_release()
        .arg("rc")
        .arg("--dry-run")
        .arg("--root")
        .arg(dir.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("2.0.0-rc4"));
    assert!(stdout.contains("Dry run finished for v2.0.0-rc4"));
    assert_eq!(fs::read_to_string(dir.path().join("Cargo.toml")).unwrap(), manifest);
}

#[test]
fn test_missing_version_field_fails_first_stage() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();

    let output = bump_release()
        .args(["patch", "--yes", "--root"])
        .arg(dir.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Stage 'parse-version' failed"));
}

#[test]
fn test_missing_version_field_before_confirmation() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();

    let output = bump_release()
        .arg("minor")
        .arg("--root")
        .arg(dir.path())
        .stdin(std::process::Stdio::null())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Stage 'parse-version' failed"));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("(y/N)"));
}
