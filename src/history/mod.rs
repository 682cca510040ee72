//! Run history persistence and trend comparison

use anyhow::{Context, Result};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Output;
use crate::reports::RunSummary;

/// Number of runs shown by [`HistoryManager::display`]
pub const DISPLAYED_RUNS: usize = 10;

const RULE_WIDTH: usize = 70;

/// Direction of the failed-file count compared to the previous run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Fewer failed files than last time
    Improved(usize),
    /// More failed files than last time
    Degraded(usize),
    Stable,
    /// No previous run to compare against
    Baseline,
}

impl Trend {
    pub fn between(previous: Option<&RunSummary>, current: &RunSummary) -> Self {
        let Some(previous) = previous else {
            return Trend::Baseline;
        };

        match current.failed.cmp(&previous.failed) {
            std::cmp::Ordering::Less => Trend::Improved(previous.failed - current.failed),
            std::cmp::Ordering::Greater => Trend::Degraded(current.failed - previous.failed),
            std::cmp::Ordering::Equal => Trend::Stable,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Trend::Improved(change) => {
                format!("Quality improved! Fewer failed files. ({change} change)")
            }
            Trend::Degraded(change) => {
                format!("Quality degraded. More failed files. ({change} change)")
            }
            Trend::Stable => "Quality remained stable. (0 change)".to_string(),
            Trend::Baseline => "No previous history found. Creating baseline.".to_string(),
        }
    }
}

/// Reads and writes the JSON history file
pub struct HistoryManager {
    path: PathBuf,
}

impl HistoryManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored runs, oldest first; a missing or unreadable file yields none
    pub fn load(&self) -> Vec<RunSummary> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable history {}: {}", self.path.display(), e);
            Vec::new()
        })
    }

    pub fn save(&self, history: &[RunSummary]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(history)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to save history to {}", self.path.display()))
    }

    /// Compare `current` to the last stored run, then append and save it
    ///
    /// Returns the trend along with the run it was compared against. A failed
    /// save is logged; it never affects the outcome of the run.
    pub fn record(&self, current: &RunSummary) -> (Trend, Option<RunSummary>) {
        let mut history = self.load();
        let previous = history.last().cloned();
        let trend = Trend::between(previous.as_ref(), current);

        history.push(current.clone());
        if let Err(e) = self.save(&history) {
            tracing::warn!("{:#}", e);
        }

        (trend, previous)
    }

    /// Print the most recent runs as a table
    pub fn display(&self, output: &Output) {
        let history = self.load();
        if history.is_empty() {
            output.warning("No analysis history found.");
            return;
        }

        let rule = style("=".repeat(RULE_WIDTH)).magenta();
        println!("\n{rule}");
        println!("{}", style(format!("   ANALYSIS HISTORY (Last {DISPLAYED_RUNS} Runs)")).bold());
        println!("{rule}");
        println!(
            "{:<20} | {:<6} | {:<5} | {:<5} | {:<6}",
            "TIMESTAMP", "TOTAL", "PASS", "FAIL", "FIXED"
        );
        println!("{}", "-".repeat(RULE_WIDTH));

        for run in recent(&history) {
            println!(
                "{:<20} | {:<6} | {:<5} | {:<5} | {:<6}",
                run.timestamp, run.total_files, run.passed, run.failed, run.fixed
            );
        }
        println!("{rule}\n");
    }
}

/// The last [`DISPLAYED_RUNS`] entries
pub fn recent(history: &[RunSummary]) -> &[RunSummary] {
    &history[history.len().saturating_sub(DISPLAYED_RUNS)..]
}

/// Print the trend section shown after an analysis
pub fn print_trend(output: &Output, current: &RunSummary, trend: Trend, previous: Option<&RunSummary>) {
    if output.is_quiet() {
        return;
    }

    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{rule}");
    println!("{}", style("   CODE QUALITY TREND ANALYSIS   ").bold());
    println!("{rule}");

    if let Some(previous) = previous {
        println!("Last Scan ({}): Failed Files: {}", previous.timestamp, previous.failed);
        println!("Current Scan ({}): Failed Files: {}", current.timestamp, current.failed);
    }

    let message = trend.message();
    match trend {
        Trend::Improved(_) => println!("\n{}", style(format!("⬆  Trend: {message}")).green().bold()),
        Trend::Degraded(_) => println!("\n{}", style(format!("⬇  Trend: {message}")).red().bold()),
        Trend::Stable => println!("\n{}", style(format!("=  Trend: {message}")).yellow().bold()),
        Trend::Baseline => println!("{}", style(message).cyan()),
    }
}
