//! Integration tests for the Codex CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn codex(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("codex").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    path
}

/// Project with a `.codexrc.json` wiring python to stand-in shell tools
fn project(lint_body: &str, fix_body: Option<&str>) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let tools_dir = temp_dir.path().join("tools");
    fs::create_dir(&tools_dir).unwrap();

    let lint = write_script(&tools_dir, "lint.sh", lint_body);
    let mut tools = vec![serde_json::json!({
        "tool": "lint",
        "command": ["sh", lint.display().to_string()],
        "check": true,
        "fix": false,
    })];
    if let Some(fix_body) = fix_body {
        let fix = write_script(&tools_dir, "fmt.sh", fix_body);
        tools.insert(
            0,
            serde_json::json!({
                "tool": "fmt",
                "command": ["sh", fix.display().to_string()],
                "check": false,
                "fix": true,
            }),
        );
    }

    let config = serde_json::json!({
        "app_settings": {
            "max_workers": 2,
            "history_file": "history.json",
            "output_dir": "out",
        },
        "language_tools": { "python": tools },
    });
    fs::write(
        temp_dir.path().join(".codexrc.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();

    fs::create_dir(temp_dir.path().join("src")).unwrap();
    temp_dir
}

const LINT_IMPORTS: &str =
    "grep -q import \"$1\" && { echo 'line 3: unused import'; exit 1; }\nexit 0";

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    Command::cargo_bin("codex")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("quality gate"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    Command::cargo_bin("codex")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("codex"));
}

/// Test invalid subcommand shows error
#[test]
fn test_invalid_subcommand() {
    Command::cargo_bin("codex")
        .unwrap()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[cfg(unix)]
#[test]
fn test_analyze_blocks_on_failed_file() {
    let temp_dir = project(LINT_IMPORTS, None);
    let src = temp_dir.path().join("src");
    fs::write(src.join("a.py"), "import os\n").unwrap();
    fs::write(src.join("b.py"), "x = 1\n").unwrap();

    codex(temp_dir.path())
        .args(["analyze", "src"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failed: 1"))
        .stdout(predicate::str::contains("Passed: 1"))
        .stdout(predicate::str::contains("[lint] line 3: unused import"))
        .stdout(predicate::str::contains("MERGE BLOCKED"));

    let reports: Vec<_> = fs::read_dir(temp_dir.path().join("out"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(reports.len(), 1);
    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&reports[0]).unwrap()).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 2);

    let history: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp_dir.path().join("history.json")).unwrap())
            .unwrap();
    assert_eq!(history[0]["failed"], 1);
    assert_eq!(history[0]["total_files"], 2);
}

#[cfg(unix)]
#[test]
fn test_analyze_clean_tree_passes_and_tracks_trend() {
    let temp_dir = project(LINT_IMPORTS, None);
    fs::write(temp_dir.path().join("src").join("b.py"), "x = 1\n").unwrap();

    codex(temp_dir.path())
        .args(["analyze", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Creating baseline"))
        .stdout(predicate::str::contains("MERGE BLOCKED").not());

    codex(temp_dir.path())
        .args(["analyze", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quality remained stable"));

    codex(temp_dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("ANALYSIS HISTORY"));
}

#[cfg(unix)]
#[test]
fn test_analyze_fix_mode_rewrites_file() {
    let temp_dir = project(LINT_IMPORTS, Some("printf 'x = 1\\n' > \"$1\""));
    let file = temp_dir.path().join("src").join("c.py");
    fs::write(&file, "import os\n").unwrap();

    codex(temp_dir.path())
        .args(["analyze", "src", "--fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(Fixed)"));

    assert_eq!(fs::read_to_string(&file).unwrap(), "x = 1\n");
    assert!(!temp_dir.path().join("src").join("c.py.codex.bak").exists());
}

#[cfg(unix)]
#[test]
fn test_analyze_verbose_lists_each_file() {
    let temp_dir = project(LINT_IMPORTS, None);
    fs::write(temp_dir.path().join("src").join("b.py"), "x = 1\n").unwrap();

    codex(temp_dir.path())
        .args(["-v", "analyze", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✔").and(predicate::str::contains("b.py")));
}

#[test]
fn test_analyze_missing_path_fails() {
    let temp_dir = TempDir::new().unwrap();

    codex(temp_dir.path())
        .args(["analyze", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cleanup_removes_orphaned_backups() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("node_modules").join("pkg");
    fs::create_dir_all(&nested).unwrap();
    fs::write(temp_dir.path().join("a.py.codex.bak"), "old").unwrap();
    fs::write(nested.join("index.js.codex.bak"), "old").unwrap();
    fs::write(temp_dir.path().join("a.py"), "keep").unwrap();

    codex(temp_dir.path())
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 orphaned backup files"));

    assert!(temp_dir.path().join("a.py").exists());
    assert!(!temp_dir.path().join("a.py.codex.bak").exists());

    codex(temp_dir.path())
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("No orphaned backup files found"));
}

#[test]
fn test_config_shows_effective_settings() {
    let temp_dir = TempDir::new().unwrap();

    codex(temp_dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Max Workers"))
        .stdout(predicate::str::contains("node_modules"))
        .stdout(predicate::str::contains("python"));
}

#[test]
fn test_history_without_runs() {
    let temp_dir = TempDir::new().unwrap();

    codex(temp_dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No analysis history found"));
}
