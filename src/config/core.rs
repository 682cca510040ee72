use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use std::path::{Path, PathBuf};

use super::RawConfig;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Project configuration files, first match wins
pub const CONFIG_FILES: [&str; 4] = [".codexrc.json", "codex.json", "codex.toml", "codex.yaml"];

/// Build the raw configuration from defaults, one project file and the environment
///
/// A file that fails to parse is skipped and the next candidate is tried. When
/// nothing usable remains the embedded defaults are returned; loading never fails.
pub(crate) fn load_raw(custom_config: Option<&Path>) -> RawConfig {
    let candidates: Vec<PathBuf> = match custom_config {
        Some(path) => {
            if !path.exists() {
                tracing::warn!("Config file {} does not exist, using defaults", path.display());
            }
            vec![path.to_path_buf()]
        }
        None => CONFIG_FILES.iter().map(PathBuf::from).collect(),
    };

    for candidate in candidates.iter().filter(|path| path.is_file()) {
        let figment = with_file(defaults(), candidate).merge(environment());
        match figment.extract::<RawConfig>() {
            Ok(raw) => {
                tracing::info!("Loaded configuration from {}", candidate.display());
                return raw;
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}. Skipping.", candidate.display(), e);
            }
        }
    }

    defaults()
        .merge(environment())
        .extract()
        .unwrap_or_else(|e| {
            tracing::error!("Invalid CODEX_ environment configuration: {}", e);
            builtin()
        })
}

/// Embedded defaults only, ignoring files and the environment
pub(crate) fn builtin() -> RawConfig {
    defaults().extract().unwrap_or_else(|e| {
        tracing::error!("Embedded default configuration is invalid: {}", e);
        RawConfig::default()
    })
}

fn defaults() -> Figment {
    Figment::new().merge(Toml::string(DEFAULT_CONFIG))
}

fn environment() -> Env {
    Env::prefixed("CODEX_").split("__")
}

fn with_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}
