//! Per-file analysis pipeline
//!
//! [`FileProcessor`] takes one file through the fix phase (only in fix mode,
//! under the file's lock) and then the check phase, and folds every tool outcome
//! into an [`AnalysisResult`]. [`DirectoryScanner`] feeds discovered files to a
//! worker pool running the processor.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError};

use crate::config::{CodexConfig, ToolSpec};
use crate::locks::LockRegistry;
use crate::tools::{ToolExit, ToolOutput, ToolRunner};

pub mod aggregator;
pub mod directory;


pub use aggregator::ResultAggregator;
pub use directory::DirectoryScanner;

/// Error recorded for files no tool chain applies to
pub const UNSUPPORTED_MESSAGE: &str = "Unsupported language/extension";

/// Output lines kept per failing tool
pub const MAX_ERROR_LINES_PER_TOOL: usize = 5;

/// Outcome of analysing one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_path: String,
    pub language: String,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub was_fixed: bool,
}

impl AnalysisResult {
    /// Result for a file without a usable tool chain
    pub fn unsupported(path: &Path) -> Self {
        Self {
            file_path: path.display().to_string(),
            language: "Unknown".to_string(),
            success: false,
            errors: vec![UNSUPPORTED_MESSAGE.to_string()],
            warnings: Vec::new(),
            was_fixed: false,
        }
    }

    /// Result for a file whose processing aborted unexpectedly
    pub fn processing_failure(path: &Path, message: &str) -> Self {
        Self {
            file_path: path.display().to_string(),
            language: "Unknown".to_string(),
            success: false,
            errors: vec![format!("Processing failed: {message}")],
            warnings: Vec::new(),
            was_fixed: false,
        }
    }
}

/// Runs the fix and check phases for single files
///
/// Shared by all workers of a scan; the lock registry inside serializes fixers
/// that target the same file.
#[derive(Debug)]
pub struct FileProcessor {
    config: Arc<CodexConfig>,
    runner: ToolRunner,
    locks: LockRegistry,
    fix_mode: bool,
}

impl FileProcessor {
    pub fn new(config: Arc<CodexConfig>, fix_mode: bool) -> Self {
        let runner = ToolRunner::new(config.default_timeout());
        Self {
            config,
            runner,
            locks: LockRegistry::new(),
            fix_mode,
        }
    }

    pub fn fix_mode(&self) -> bool {
        self.fix_mode
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// Analyse one file: optional fix phase, then check phase
    pub fn process(&self, file: &Path) -> AnalysisResult {
        let languages = self.config.languages();
        let Some((language, tools)) = languages
            .language_for(file)
            .and_then(|language| Some((language, languages.tools_for(language)?)))
        else {
            return AnalysisResult::unsupported(file);
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let was_fixed = self.fix_mode && self.fix_phase(file, tools, &mut errors, &mut warnings);
        self.check_phase(file, tools, &mut errors, &mut warnings);

        AnalysisResult {
            file_path: file.display().to_string(),
            language: display_language(language),
            success: errors.is_empty(),
            errors,
            warnings,
            was_fixed,
        }
    }

    /// Apply fixers in declared order until the first one succeeds
    ///
    /// At most one fixer mutates the file per run. Failed fixers have already
    /// been rolled back by the runner; their output is recorded as errors.
    fn fix_phase(
        &self,
        file: &Path,
        tools: &[ToolSpec],
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> bool {
        let lock = self.locks.acquire(file);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        for spec in tools.iter().filter(|spec| spec.role().fixes()) {
            let output = self.runner.run(file, spec, true);
            match output.exit {
                ToolExit::Success => {
                    tracing::debug!("{} fixed {}", spec.name(), file.display());
                    return true;
                }
                ToolExit::NotFound => push_unique(warnings, not_available(spec)),
                _ => errors.extend(summarize_failure(spec, &output, true)),
            }
        }

        false
    }

    /// Run every checker in declared order; checkers must not mutate the file
    fn check_phase(
        &self,
        file: &Path,
        tools: &[ToolSpec],
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        for spec in tools.iter().filter(|spec| spec.role().checks()) {
            let output = self.runner.run(file, spec, false);
            match output.exit {
                ToolExit::NotFound => push_unique(warnings, not_available(spec)),
                exit if !exit.is_success() || !output.stderr.is_empty() => {
                    errors.extend(summarize_failure(spec, &output, false));
                }
                _ => {}
            }
        }
    }
}

fn not_available(spec: &ToolSpec) -> String {
    format!("{} not available. Install it.", spec.name())
}

fn push_unique(list: &mut Vec<String>, message: String) {
    if !list.contains(&message) {
        list.push(message);
    }
}

/// Turn a failing tool's output into at most [`MAX_ERROR_LINES_PER_TOOL`] error lines
///
/// Fixer output leads with stderr so the rollback annotation is kept.
fn summarize_failure(spec: &ToolSpec, output: &ToolOutput, fixer: bool) -> Vec<String> {
    let combined = if fixer {
        format!("{}{}", output.stderr, output.stdout)
    } else {
        format!("{}{}", output.stdout, output.stderr)
    };

    let lines: Vec<String> = combined
        .lines()
        .take(MAX_ERROR_LINES_PER_TOOL)
        .map(|line| format!("[{}] {}", spec.name(), line))
        .collect();

    if lines.is_empty() {
        vec![format!("Exit code {} from {}", output.code(), spec.name())]
    } else {
        lines
    }
}

/// Language id as shown in reports: first letter upper-cased, the rest lower-cased
fn display_language(language: &str) -> String {
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
