//! Helpers for tests that need stand-in external tools
//!
//! Tools are small `sh` scripts invoked as `sh <script> <file>`, so `$1` inside a
//! script is the target file's absolute path.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{ToolRole, ToolSpec};

/// Write a shell script body to `dir/name`
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    path
}

/// Tool spec running `script` through `sh`
pub fn script_tool(name: &str, script: &Path, role: ToolRole) -> ToolSpec {
    ToolSpec::new(
        name,
        vec!["sh".to_string(), script.display().to_string()],
        role,
        None,
    )
    .unwrap()
}

/// Same as [`script_tool`] with an explicit timeout
pub fn script_tool_with_timeout(
    name: &str,
    script: &Path,
    role: ToolRole,
    timeout: Duration,
) -> ToolSpec {
    ToolSpec::new(
        name,
        vec!["sh".to_string(), script.display().to_string()],
        role,
        Some(timeout),
    )
    .unwrap()
}

/// Tool whose executable does not exist anywhere on the search path
pub fn missing_tool(name: &str, role: ToolRole) -> ToolSpec {
    ToolSpec::new(
        name,
        vec!["codex-test-no-such-tool-7f3a".to_string()],
        role,
        None,
    )
    .unwrap()
}

/// Count lines in a spy log; missing file means the spy never ran
pub fn spy_calls(log: &Path) -> usize {
    fs::read_to_string(log)
        .map(|content| content.lines().count())
        .unwrap_or(0)
}
