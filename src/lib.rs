//! # Codex - Concurrent code quality gate
//!
//! Codex walks a file tree, hands every recognised source file to a fixed-size
//! worker pool and runs the configured external checkers (linters) and fixers
//! (formatters) against it. The combined verdict is a quality gate: the run
//! passes only when no file reports an error.
//!
//! ## Features
//!
//! - **Per-file pipeline**: optional fix phase under a per-file lock, then checks
//! - **Crash-safe fixing**: every fixer run is backed up and rolled back on failure
//! - **Timeouts**: each tool invocation is bounded and killed when it overruns
//! - **Trend tracking**: run summaries are kept in a JSON history file
//!
//! ## Quick Start
//!
//! ```bash
//! # Check the current directory
//! codex analyze
//!
//! # Check and auto-fix a project
//! codex analyze ./my-project --fix
//!
//! # Remove backups left behind by an interrupted run
//! codex cleanup ./my-project
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use codex::analyzer::{DirectoryScanner, FileProcessor};
//! use codex::config::CodexConfig;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = Arc::new(CodexConfig::load(None));
//! let processor = Arc::new(FileProcessor::new(config.clone(), false));
//! let scanner = DirectoryScanner::new(config, processor);
//!
//! let aggregate = scanner.scan(Path::new("src/"), |_| {})?;
//! for result in aggregate.results() {
//!     println!("{} -> {}", result.file_path, result.success);
//! }
//! println!("gate passed: {}", aggregate.gate_passed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod history;
pub mod locks;
pub mod parallel;
pub mod reports;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_support;

pub use analyzer::AnalysisResult;
pub use config::CodexConfig;

/// Result type alias for Codex operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
