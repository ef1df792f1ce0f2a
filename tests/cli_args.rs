//! Integration tests for the folio binary
//!
//! Network-facing tests point at a closed local port so every request fails
//! fast; the cache directory is always a temp dir.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

/// Nothing listens on the discard port in test environments
const UNREACHABLE_API: &str = "http://127.0.0.1:9/v1";

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_folio"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute folio")
}

/// Runs against the unreachable API with a temp cache and no retry delay
fn run_offline(cache_dir: &Path, args: &[&str]) -> std::process::Output {
    let dir = cache_dir.to_str().expect("utf-8 temp path");
    let mut full = vec![
        "--base-url",
        UNREACHABLE_API,
        "--max-retries",
        "1",
        "--retry-delay-ms",
        "1",
        "--cache-dir",
        dir,
    ];
    full.extend_from_slice(args);
    run_cli(&full)
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_millis() as i64
}

/// Writes a cache entry the way the binary stores it
fn seed_cache(dir: &Path, key: &str, data: &str, timestamp: i64) {
    let body = format!(r#"{{"data":{},"timestamp":{}}}"#, data, timestamp);
    fs::write(dir.join(format!("portfolio_cache_{}.json", key)), body).expect("seed cache");
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("folio"), "Help should mention folio");
    assert!(stdout.contains("blogs"), "Help should list the blogs command");
    assert!(stdout.contains("projects"), "Help should list the projects command");
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_base_url_prints_error_and_exits() {
    let output = run_cli(&["--base-url", "ftp://example.com", "blogs"]);
    assert!(!output.status.success(), "Expected invalid base URL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid base URL"), "stderr: {}", stderr);
}

#[test]
fn test_blank_slug_is_rejected() {
    let output = run_cli(&["blog", " "]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("slug"), "stderr: {}", stderr);
}

#[test]
fn test_unreachable_api_without_cache_shows_error_placeholder() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_offline(temp_dir.path(), &["blogs"]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Something went wrong"), "stdout: {}", stdout);
    assert!(
        fs::read_dir(temp_dir.path()).unwrap().next().is_none(),
        "failed fetch must not create cache entries"
    );
}

#[test]
fn test_fresh_cache_is_served_when_api_is_down() {
    let temp_dir = TempDir::new().unwrap();
    seed_cache(
        temp_dir.path(),
        "blogs",
        r#"{"data":[{"slug":"cached-post","title":"Cached Post"}]}"#,
        now_ms(),
    );

    let output = run_offline(temp_dir.path(), &["blogs"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cached Post"), "stdout: {}", stdout);

    // Failed background refresh leaves the entry in place
    let status = run_offline(temp_dir.path(), &["cache", "status"]);
    let stdout = String::from_utf8_lossy(&status.stdout);
    assert!(stdout.contains("blogs"), "stdout: {}", stdout);
    assert!(stdout.contains("fresh"), "stdout: {}", stdout);
}

#[test]
fn test_expired_cache_is_not_served() {
    let temp_dir = TempDir::new().unwrap();
    let eleven_minutes = 11 * 60 * 1000;
    seed_cache(
        temp_dir.path(),
        "projects",
        r#"[{"title":"Old Project"}]"#,
        now_ms() - eleven_minutes,
    );

    let output = run_offline(temp_dir.path(), &["projects"]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Old Project"), "stdout: {}", stdout);
    assert!(
        !temp_dir.path().join("portfolio_cache_projects.json").exists(),
        "expired entry should be deleted on read"
    );
}

#[test]
fn test_json_output_for_cached_projects() {
    let temp_dir = TempDir::new().unwrap();
    seed_cache(
        temp_dir.path(),
        "featured_projects",
        r#"[{"title":"Star","featured":true}]"#,
        now_ms(),
    );

    let output = run_offline(temp_dir.path(), &["projects", "--featured", "--json"]);

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["success"], true);
    assert_eq!(value["fromCache"], true);
    assert_eq!(value["data"][0]["title"], "Star");
}

#[test]
fn test_cache_clear_removes_entries() {
    let temp_dir = TempDir::new().unwrap();
    seed_cache(temp_dir.path(), "blogs", "[]", now_ms());
    seed_cache(temp_dir.path(), "projects", "[]", now_ms());

    let output = run_offline(temp_dir.path(), &["cache", "clear", "blogs"]);
    assert!(output.status.success());
    assert!(!temp_dir.path().join("portfolio_cache_blogs.json").exists());
    assert!(temp_dir.path().join("portfolio_cache_projects.json").exists());

    let output = run_offline(temp_dir.path(), &["cache", "clear"]);
    assert!(output.status.success());
    assert!(!temp_dir.path().join("portfolio_cache_projects.json").exists());

    let status = run_offline(temp_dir.path(), &["cache", "status"]);
    assert!(String::from_utf8_lossy(&status.stdout).contains("Cache is empty"));
}

#[test]
fn test_no_persist_ignores_disk_cache() {
    let temp_dir = TempDir::new().unwrap();
    seed_cache(temp_dir.path(), "blogs", r#"[{"title":"On Disk"}]"#, now_ms());

    let output = run_offline(temp_dir.path(), &["blogs", "--no-persist"]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("On Disk"), "stdout: {}", stdout);
    assert!(temp_dir.path().join("portfolio_cache_blogs.json").exists());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use folio::cli::{Cli, Command, StartupConfig};

    #[test]
    fn test_no_cache_flag_disables_cache() {
        let cli = Cli::parse_from(["folio", "--no-cache", "blogs"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(!config.use_cache);
        assert_eq!(config.command, Command::Blogs);
    }
}
