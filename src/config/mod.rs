//! Configuration management for Codex
//!
//! Settings and tool chains are loaded once per run from the embedded defaults,
//! an optional project file and `CODEX_*` environment variables, then frozen
//! into a [`CodexConfig`] that workers share read-only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

mod core;
pub mod languages;


pub use self::core::CONFIG_FILES;
pub use languages::{LanguageMap, ToolRole, ToolSpec};

/// Directories that are never descended into
pub const DEFAULT_SKIP_DIRS: [&str; 9] = [
    "node_modules",
    "venv",
    ".venv",
    "__pycache__",
    ".git",
    "build",
    "dist",
    ".ipynb_checkpoints",
    "site-packages",
];

/// General run settings (`[app_settings]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Worker pool size (0 = one worker per CPU core)
    pub max_workers: usize,

    /// JSON file holding previous run summaries
    pub history_file: String,

    /// Directory receiving exported JSON reports
    pub output_dir: String,

    /// Timeout in seconds for tools without their own
    pub default_timeout: u64,

    /// Extra directory names to skip, on top of [`DEFAULT_SKIP_DIRS`]
    pub skip_dirs: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_workers: 4,
            history_file: "codex_history.json".to_string(),
            output_dir: "reports".to_string(),
            default_timeout: 30,
            skip_dirs: Vec::new(),
        }
    }
}

/// Configuration as read from the providers, before validation
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConfig {
    #[serde(default)]
    pub app_settings: AppSettings,

    #[serde(default)]
    pub extensions: BTreeMap<String, String>,

    #[serde(default)]
    pub language_tools: BTreeMap<String, Value>,
}

/// Validated, immutable configuration for one run
#[derive(Debug, Clone)]
pub struct CodexConfig {
    pub app: AppSettings,
    skip_dirs: BTreeSet<String>,
    languages: LanguageMap,
}

impl CodexConfig {
    /// Assemble a configuration from already validated parts
    pub fn new(app: AppSettings, languages: LanguageMap) -> Self {
        let skip_dirs = DEFAULT_SKIP_DIRS
            .iter()
            .map(|dir| dir.to_string())
            .chain(app.skip_dirs.iter().cloned())
            .collect();

        Self {
            app,
            skip_dirs,
            languages,
        }
    }

    /// Load from the working directory (or `custom_config`) and the environment
    ///
    /// Falls back to the built-in defaults if no usable source is found.
    pub fn load(custom_config: Option<&Path>) -> Self {
        Self::from_raw(core::load_raw(custom_config))
    }

    /// Built-in defaults only
    pub fn builtin() -> Self {
        Self::from_raw(core::builtin())
    }

    pub(crate) fn from_raw(raw: RawConfig) -> Self {
        let languages = LanguageMap::from_config(&raw.extensions, &raw.language_tools);
        Self::new(raw.app_settings, languages)
    }

    pub fn languages(&self) -> &LanguageMap {
        &self.languages
    }

    pub fn skip_dirs(&self) -> &BTreeSet<String> {
        &self.skip_dirs
    }

    pub fn should_skip_dir(&self, name: &str) -> bool {
        self.skip_dirs.contains(name)
    }

    /// Timeout applied to tools that do not declare their own
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.app.default_timeout.max(1))
    }

    /// Worker pool size, resolving 0 to the CPU count
    pub fn worker_count(&self) -> usize {
        match self.app.max_workers {
            0 => num_cpus::get().max(1),
            workers => workers,
        }
    }
}

impl Default for CodexConfig {
    fn default() -> Self {
        Self::builtin()
    }
}
