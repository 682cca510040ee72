//! End-of-run reporting
//!
//! Builds the [`RunSummary`] kept in history, prints the final report table and
//! exports the per-file results as JSON.

use anyhow::{Context, Result};
use chrono::Local;
use console::style;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::analyzer::{AnalysisResult, ResultAggregator};
use crate::cli::Output;

/// Timestamp layout used in summaries and history
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Width of the file column in the report table
const FILE_COLUMN_WIDTH: usize = 30;

/// Error lines shown under each failed file
const ERRORS_SHOWN_PER_FILE: usize = 3;

const RULE_WIDTH: usize = 70;

/// Summary of one run, as stored in the history file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub total_files: usize,
    pub passed: usize,
    pub failed: usize,
    pub fixed: usize,
}

impl RunSummary {
    /// Summarize a finished run, stamped with the current local time
    pub fn from_aggregator(aggregator: &ResultAggregator) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            total_files: aggregator.total(),
            passed: aggregator.passed(),
            failed: aggregator.failed(),
            fixed: aggregator.fixed(),
        }
    }

    pub fn gate_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Shorten a path for the file column, keeping its tail
pub fn truncate_path(path: &str) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= FILE_COLUMN_WIDTH {
        return path.to_string();
    }

    let tail: String = chars[chars.len() - (FILE_COLUMN_WIDTH - 3)..].iter().collect();
    format!("...{tail}")
}

/// Details column: error count or `OK`, with a fixed marker
pub fn detail_text(result: &AnalysisResult) -> String {
    let mut info = if result.success {
        "OK".to_string()
    } else {
        format!("{} Err", result.errors.len())
    };
    if result.was_fixed {
        info.push_str(" (Fixed)");
    }
    info
}

/// Print the final report table with totals and the gate verdict
pub fn print_report(output: &Output, aggregator: &ResultAggregator) {
    if output.is_quiet() {
        return;
    }

    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{rule}");
    println!("{}", style("   CODEX - FINAL REPORT   ").bold());
    println!("{rule}");
    println!(
        "{}",
        style(format!(
            "{:<8} | {:<10} | {:<30} | DETAILS",
            "STATUS", "TYPE", "FILE"
        ))
        .bold()
    );
    println!("{}", "-".repeat(RULE_WIDTH));

    for result in aggregator.results() {
        let status = if result.success {
            style("✔").green()
        } else {
            style("✖").red()
        };
        let fix_marker = if result.was_fixed { "🔧" } else { " " };

        println!(
            "   {} {}  | {:<10} | {:<30} | {}",
            status,
            fix_marker,
            result.language,
            truncate_path(&result.file_path),
            detail_text(result)
        );

        if !result.success {
            for error in result.errors.iter().take(ERRORS_SHOWN_PER_FILE) {
                println!("         {}", style(format!("└─ {error}")).red());
            }
        }
    }

    println!("{}", "-".repeat(RULE_WIDTH));
    println!(
        "Files: {} | {} | {} | {}",
        aggregator.total(),
        style(format!("Passed: {}", aggregator.passed())).green(),
        style(format!("Failed: {}", aggregator.failed())).red(),
        style(format!("Auto-Fixed: {}", aggregator.fixed())).yellow()
    );

    if !aggregator.gate_passed() {
        println!(
            "\n{}",
            style(format!(
                "[!] MERGE BLOCKED: Fix {} failed files to pass the Quality Gate.",
                aggregator.failed()
            ))
            .red()
        );
    }
}

/// Write all results as a JSON array to `<output_dir>/codex_report_<unix secs>.json`
pub fn export_json(results: &[AnalysisResult], output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create report directory {}", output_dir.display()))?;

    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let report_path = output_dir.join(format!("codex_report_{secs}.json"));

    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    fs::write(&report_path, json)
        .with_context(|| format!("Failed to write report {}", report_path.display()))?;

    tracing::info!("Exported report to {}", report_path.display());
    Ok(report_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn result(path: &str, errors: &[&str], fixed: bool) -> AnalysisResult {
        AnalysisResult {
            file_path: path.to_string(),
            language: "Python".to_string(),
            success: errors.is_empty(),
            errors: errors.iter().map(|e| e.to_string()).collect(),
            warnings: vec![],
            was_fixed: fixed,
        }
    }

    #[test]
    fn test_summary_counts() {
        let aggregator: ResultAggregator = vec![
            result("a.py", &["[lint] line 3: unused import"], false),
            result("b.py", &[], false),
            result("c.py", &[], true),
        ]
        .into_iter()
        .collect();

        let summary = RunSummary::from_aggregator(&aggregator);

        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.fixed, 1);
        assert!(!summary.gate_passed());
        assert!(chrono::NaiveDateTime::parse_from_str(&summary.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_truncate_path() {
        assert_eq!(truncate_path("src/app.py"), "src/app.py");

        let long = "project/very/deeply/nested/package/module_name.py";
        let truncated = truncate_path(long);
        assert_eq!(truncated.chars().count(), 30);
        assert!(truncated.starts_with("..."));
        assert!(truncated.ends_with("module_name.py"));

        let exact = "a".repeat(30);
        assert_eq!(truncate_path(&exact), exact);
    }

    #[test]
    fn test_detail_text() {
        assert_eq!(detail_text(&result("a.py", &[], false)), "OK");
        assert_eq!(detail_text(&result("a.py", &[], true)), "OK (Fixed)");
        assert_eq!(detail_text(&result("a.py", &["x", "y"], false)), "2 Err");
        assert_eq!(detail_text(&result("a.py", &["x"], true)), "1 Err (Fixed)");
    }

    #[test]
    fn test_export_json_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("reports").join("nested");
        let results = vec![
            result("a.py", &["[lint] line 3: unused import"], false),
            result("b.py", &[], true),
        ];

        let path = export_json(&results, &output_dir).unwrap();

        assert!(path.starts_with(&output_dir));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("codex_report_") && name.ends_with(".json"));

        let loaded: Vec<AnalysisResult> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, results);
    }

    #[test]
    fn test_export_json_record_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = export_json(&[result("a.py", &[], false)], temp_dir.path()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        let record = &value[0];
        for key in ["file_path", "language", "success", "errors", "warnings", "was_fixed"] {
            assert!(record.get(key).is_some(), "missing {key}");
        }
    }
}
