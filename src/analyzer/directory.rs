//! Directory traversal and parallel file processing

use anyhow::{Result, bail};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{AnalysisResult, FileProcessor, ResultAggregator};
use crate::config::CodexConfig;
use crate::parallel::ParallelExecutor;

/// Walks a tree and runs every eligible file through a [`FileProcessor`]
///
/// Directories named in the skip-set are pruned before descent, so nothing
/// beneath them is ever visited. Discovery order follows the walk and is not
/// stable across platforms; results are reported in completion order.
pub struct DirectoryScanner {
    config: Arc<CodexConfig>,
    processor: Arc<FileProcessor>,
}

impl DirectoryScanner {
    pub fn new(config: Arc<CodexConfig>, processor: Arc<FileProcessor>) -> Self {
        Self { config, processor }
    }

    /// Collect every file under `root` whose extension maps to a language
    pub fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            bail!("Path does not exist: {}", root.display());
        }

        let skip_dirs: Arc<BTreeSet<String>> = Arc::new(self.config.skip_dirs().clone());

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false) // Plain walk: no gitignore or hidden-file rules
            .follow_links(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(is_dir
                    && entry.depth() > 0
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| skip_dirs.contains(name)))
            });

        let languages = self.config.languages();
        let mut files = Vec::new();

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // Log error but continue walking
                    tracing::warn!("Error walking directory: {}", err);
                    continue;
                }
            };

            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                continue;
            }

            let path = entry.path();
            if languages.is_recognized(path) && path.is_file() {
                files.push(path.to_path_buf());
            }
        }

        tracing::info!("Discovered {} files to analyze", files.len());
        Ok(files)
    }

    /// Analyse every eligible file under `root` with the configured processor
    ///
    /// `on_result` is called on the calling thread for each result as soon as it
    /// completes.
    pub fn scan<C>(&self, root: &Path, on_result: C) -> Result<ResultAggregator>
    where
        C: FnMut(&AnalysisResult),
    {
        let files = self.discover_files(root)?;
        self.scan_files(files, on_result)
    }

    /// Analyse an already discovered file list
    pub fn scan_files<C>(&self, files: Vec<PathBuf>, on_result: C) -> Result<ResultAggregator>
    where
        C: FnMut(&AnalysisResult),
    {
        let processor = self.processor.clone();
        self.process_files(files, move |file| processor.process(file), on_result)
    }

    /// Same as [`scan`](Self::scan) with a custom per-file function
    ///
    /// A panic inside `process` is contained to its file and reported as a
    /// failed result; the rest of the scan is unaffected.
    pub fn scan_with<F, C>(&self, root: &Path, process: F, on_result: C) -> Result<ResultAggregator>
    where
        F: Fn(&Path) -> AnalysisResult + Sync,
        C: FnMut(&AnalysisResult),
    {
        let files = self.discover_files(root)?;
        self.process_files(files, process, on_result)
    }

    fn process_files<F, C>(&self, files: Vec<PathBuf>, process: F, on_result: C) -> Result<ResultAggregator>
    where
        F: Fn(&Path) -> AnalysisResult + Sync,
        C: FnMut(&AnalysisResult),
    {
        let executor = ParallelExecutor::new(self.config.worker_count());

        let results = executor.execute(
            files,
            |file, _worker_id| process(file),
            |file, message| AnalysisResult::processing_failure(file, &message),
            on_result,
        )?;

        Ok(results.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppSettings, LanguageMap};
    use std::fs;
    use tempfile::TempDir;

    fn config_with_skips(skip_dirs: &[&str]) -> Arc<CodexConfig> {
        let app = AppSettings {
            max_workers: 3,
            skip_dirs: skip_dirs.iter().map(|s| s.to_string()).collect(),
            ..AppSettings::default()
        };
        let languages = LanguageMap::new()
            .with_extension(".py", "python")
            .with_extension("js", "javascript");
        Arc::new(CodexConfig::new(app, languages))
    }

    fn scanner(config: Arc<CodexConfig>) -> DirectoryScanner {
        let processor = Arc::new(FileProcessor::new(config.clone(), false));
        DirectoryScanner::new(config, processor)
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn discovered(scanner: &DirectoryScanner, root: &Path) -> Vec<String> {
        let mut files: Vec<String> = scanner
            .discover_files(root)
            .unwrap()
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().display().to_string())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_only_recognized_extensions_are_collected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "a.py");
        touch(root, "web/app.js");
        touch(root, "README.md");
        touch(root, "Makefile");
        touch(root, ".hidden/tool.py");

        let files = discovered(&scanner(config_with_skips(&[])), root);

        assert_eq!(files, vec![".hidden/tool.py", "a.py", "web/app.js"]);
    }

    #[test]
    fn test_skip_set_prunes_at_any_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "main.py");
        touch(root, "node_modules/pkg/index.js");
        touch(root, "src/node_modules/deep/nested/x.py");
        touch(root, "src/lib.py");
        touch(root, "generated/out.py");
        touch(root, ".git/hooks/pre-commit.py");

        let files = discovered(&scanner(config_with_skips(&["generated"])), root);

        assert_eq!(files, vec!["main.py", "src/lib.py"]);
    }

    #[test]
    fn test_file_named_like_skip_dir_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "build.py");

        let files = discovered(&scanner(config_with_skips(&["build.py"])), root);

        assert_eq!(files, vec!["build.py"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = scanner(config_with_skips(&[]));

        assert!(scanner.discover_files(&temp_dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_panicking_file_still_yields_a_result() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["a.py", "b.py", "c.py", "d.py", "e.py"] {
            touch(root, name);
        }
        let scanner = scanner(config_with_skips(&[]));
        let mut streamed = 0;

        let aggregate = scanner
            .scan_with(
                root,
                |file| {
                    if file.ends_with("c.py") {
                        panic!("tool wrapper exploded");
                    }
                    AnalysisResult {
                        file_path: file.display().to_string(),
                        language: "Python".to_string(),
                        success: true,
                        errors: vec![],
                        warnings: vec![],
                        was_fixed: false,
                    }
                },
                |_| streamed += 1,
            )
            .unwrap();

        assert_eq!(aggregate.total(), 5);
        assert_eq!(streamed, 5);
        assert_eq!(aggregate.failed(), 1);
        let failure = aggregate.failures().next().unwrap();
        assert!(failure.file_path.ends_with("c.py"));
        assert!(failure.errors[0].contains("tool wrapper exploded"));
    }

    #[test]
    fn test_empty_tree_passes() {
        let temp_dir = TempDir::new().unwrap();
        let aggregate = scanner(config_with_skips(&[]))
            .scan(temp_dir.path(), |_| {})
            .unwrap();

        assert_eq!(aggregate.total(), 0);
        assert!(aggregate.gate_passed());
    }
}
