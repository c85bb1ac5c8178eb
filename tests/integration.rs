//! CLI tests: run the built `dsakit` binary against a throwaway config.
//!
//! None of these reach the network; ingest cases stop at validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn dsakit_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dsakit");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/dsakit.sqlite"

[workspace]
root = "{root}/DSAKit"
template_archive = "{assets}/Swift.zip"

[prompt]
template = "{assets}/Prompt.md"

[codegen]
endpoint = "http://127.0.0.1:9/v1"
api_key_env = "DSAKIT_TEST_UNSET_KEY"

[pipeline]
launch_editor = false
"#,
        root = root.display(),
        assets = assets.display()
    );

    let config_path = config_dir.join("dsakit.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_dsakit(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = dsakit_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("DSAKIT_TEST_UNSET_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run dsakit binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database_and_workspace_root() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_dsakit(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(!stdout.contains("MISSING"), "assets missing: {}", stdout);
    assert!(tmp.path().join("data/dsakit.sqlite").exists());
    assert!(tmp.path().join("DSAKit").is_dir());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_dsakit(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_dsakit(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_list_empty_catalog() {
    let (_tmp, config_path) = setup_test_env();

    run_dsakit(&config_path, &["init"]);
    let (stdout, stderr, success) = run_dsakit(&config_path, &["list"]);
    assert!(success, "list failed: {}", stderr);
    assert!(stdout.contains("No workspaces yet"));
}

#[test]
fn test_ingest_rejects_unsupported_url() {
    let (tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_dsakit(
        &config_path,
        &["--api-key", "test-key", "ingest", "https://example.com", "--progress", "off"],
    );
    assert!(!success);
    assert!(stderr.contains("unsupported URL"), "stderr: {}", stderr);
    assert!(!tmp.path().join("DSAKit").exists());
}

#[test]
fn test_ingest_without_api_key_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_dsakit(
        &config_path,
        &["ingest", "https://leetcode.com/problems/two-sum/", "--progress", "off"],
    );
    assert!(!success);
    assert!(stderr.contains("API key"), "stderr: {}", stderr);
}

#[test]
fn test_ingest_json_progress_reports_failure() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_dsakit(
        &config_path,
        &["--api-key", "test-key", "ingest", "https://example.com", "--progress", "json"],
    );
    assert!(!success);
    assert!(stderr.contains(r#""code":"validation""#), "stderr: {}", stderr);
}

#[test]
fn test_ingest_rejects_unknown_progress_mode() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_dsakit(
        &config_path,
        &["ingest", "https://leetcode.com/problems/two-sum/", "--progress", "loud"],
    );
    assert!(!success);
    assert!(stderr.contains("Unknown progress mode"));
}

#[test]
fn test_open_unknown_id_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_dsakit(&config_path, &["init"]);
    let (_, stderr, success) = run_dsakit(&config_path, &["open", "42"]);
    assert!(!success);
    assert!(stderr.contains("No workspace recorded"));
}

#[test]
fn test_invalid_config_is_reported() {
    let (tmp, _config_path) = setup_test_env();
    let bad = tmp.path().join("config/bad.toml");
    fs::write(&bad, "[pipeline]\nallowed_prefixes = []\n").unwrap();

    let (_, stderr, success) = run_dsakit(&bad, &["list"]);
    assert!(!success);
    assert!(stderr.contains("allowed_prefixes"), "stderr: {}", stderr);
}
