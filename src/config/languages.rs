//! Language and tool-chain definitions
//!
//! A [`LanguageMap`] resolves a file to a language through its extension and
//! yields the ordered [`ToolSpec`]s configured for that language. Specs are
//! validated once when the configuration is loaded; malformed entries never
//! reach the tool runner.

use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Keys every configured tool entry must carry
const REQUIRED_KEYS: [&str; 4] = ["tool", "command", "check", "fix"];

/// What a tool is allowed to do with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolRole {
    /// Inspects the file and reports issues without mutating it
    Checker,
    /// Rewrites the file in place
    Fixer,
    /// Entry flagged both `check` and `fix`
    CheckerAndFixer,
}

impl ToolRole {
    /// Build a role from the `check`/`fix` flags of a config entry
    pub fn from_flags(check: bool, fix: bool) -> Option<Self> {
        match (check, fix) {
            (true, true) => Some(Self::CheckerAndFixer),
            (true, false) => Some(Self::Checker),
            (false, true) => Some(Self::Fixer),
            (false, false) => None,
        }
    }

    pub fn checks(self) -> bool {
        matches!(self, Self::Checker | Self::CheckerAndFixer)
    }

    pub fn fixes(self) -> bool {
        matches!(self, Self::Fixer | Self::CheckerAndFixer)
    }
}

/// Immutable description of one external tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    name: String,
    command: Vec<String>,
    role: ToolRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<Duration>,
}

impl ToolSpec {
    /// Create a validated tool spec
    ///
    /// The invocation must name an executable; the file path is appended as the
    /// final argument at run time.
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        role: ToolRole,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            bail!("tool name is empty");
        }
        match command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => bail!("tool '{name}' has an empty command"),
        }
        if timeout.is_some_and(|t| t.is_zero()) {
            bail!("tool '{name}' has a zero timeout");
        }

        Ok(Self {
            name,
            command,
            role,
            timeout,
        })
    }

    /// Parse a raw configuration entry
    ///
    /// Returns an error describing why the entry was rejected.
    pub fn from_entry(entry: &Value) -> Result<Self> {
        let Some(fields) = entry.as_object() else {
            bail!("entry is not a table");
        };

        if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !fields.contains_key(**key)) {
            bail!("entry is missing '{missing}'");
        }

        let name = match fields.get("tool").and_then(Value::as_str) {
            Some(name) => name,
            None => bail!("'tool' must be a string"),
        };

        let command = match fields.get("command") {
            Some(Value::Array(parts)) => parts
                .iter()
                .map(|part| part.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>(),
            Some(Value::String(line)) => {
                Some(line.split_whitespace().map(str::to_string).collect())
            }
            _ => None,
        };
        let Some(command) = command else {
            bail!("'command' for '{name}' must be a list of strings");
        };

        let check = fields.get("check").and_then(Value::as_bool).unwrap_or(false);
        let fix = fields.get("fix").and_then(Value::as_bool).unwrap_or(false);
        let Some(role) = ToolRole::from_flags(check, fix) else {
            bail!("tool '{name}' is neither a checker nor a fixer");
        };

        let timeout = match fields.get("timeout") {
            None | Some(Value::Null) => None,
            Some(value) => match value.as_f64().filter(|secs| *secs > 0.0) {
                Some(secs) => match Duration::try_from_secs_f64(secs) {
                    Ok(timeout) => Some(timeout),
                    Err(_) => bail!("tool '{name}' has an invalid timeout"),
                },
                None => bail!("tool '{name}' has an invalid timeout"),
            },
        };

        Self::new(name, command, role, timeout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full invocation template, executable first
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Executable looked up on the search path
    pub fn program(&self) -> &str {
        // Non-empty by construction
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    pub fn role(&self) -> ToolRole {
        self.role
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Extension → language → ordered tool chain
#[derive(Debug, Clone, Default, Serialize)]
pub struct LanguageMap {
    extensions: BTreeMap<String, String>,
    tools: BTreeMap<String, Vec<ToolSpec>>,
}

impl LanguageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from raw configuration, dropping malformed entries
    pub fn from_config(
        extensions: &BTreeMap<String, String>,
        language_tools: &BTreeMap<String, Value>,
    ) -> Self {
        let mut map = Self::new();
        for (extension, language) in extensions {
            map = map.with_extension(extension, language);
        }
        for (language, tools) in validate_tool_map(language_tools) {
            map = map.with_tools(&language, tools);
        }
        map
    }

    /// Map an extension (with or without the leading dot) to a language
    pub fn with_extension(mut self, extension: &str, language: &str) -> Self {
        let extension = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{extension}")
        };
        self.extensions.insert(extension, language.to_string());
        self
    }

    /// Set the ordered tool chain for a language
    pub fn with_tools(mut self, language: &str, tools: Vec<ToolSpec>) -> Self {
        self.tools.insert(language.to_string(), tools);
        self
    }

    /// Language id for a file, by extension
    pub fn language_for(&self, path: &Path) -> Option<&str> {
        let extension = path.extension()?.to_str()?;
        self.extensions
            .get(&format!(".{extension}"))
            .map(String::as_str)
    }

    /// Whether the scanner should pick this file up
    pub fn is_recognized(&self, path: &Path) -> bool {
        self.language_for(path).is_some()
    }

    /// Tool chain for a language, if one is configured
    pub fn tools_for(&self, language: &str) -> Option<&[ToolSpec]> {
        self.tools.get(language).map(Vec::as_slice)
    }

    /// Languages with a configured tool chain
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn extensions(&self) -> &BTreeMap<String, String> {
        &self.extensions
    }
}

/// Validate every language's tool list
///
/// Non-list languages are skipped, invalid entries are dropped with a warning and
/// languages left without a valid tool are removed.
pub fn validate_tool_map(raw: &BTreeMap<String, Value>) -> BTreeMap<String, Vec<ToolSpec>> {
    let mut valid = BTreeMap::new();

    for (language, tools) in raw {
        let Some(entries) = tools.as_array() else {
            tracing::warn!("Ignoring tools for '{}': expected a list", language);
            continue;
        };

        let specs: Vec<ToolSpec> = entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match ToolSpec::from_entry(entry) {
                Ok(spec) => Some(spec),
                Err(e) => {
                    tracing::warn!("Dropping tool #{} for '{}': {}", index + 1, language, e);
                    None
                }
            })
            .collect();

        if !specs.is_empty() {
            valid.insert(language.clone(), specs);
        }
    }

    valid
}
