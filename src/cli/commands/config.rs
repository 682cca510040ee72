use anyhow::Result;
use std::path::Path;

use crate::cli::Output;
use crate::config::CodexConfig;

pub fn execute(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = CodexConfig::load(config_path);
    show(&config, output);
    Ok(())
}

/// Print the effective configuration
pub(crate) fn show(config: &CodexConfig, output: &Output) {
    output.header("CURRENT CONFIGURATION");

    let workers = match config.app.max_workers {
        0 => format!("{} (auto)", config.worker_count()),
        n => n.to_string(),
    };
    output.key_value("Max Workers:", &workers);
    output.key_value("History File:", &config.app.history_file);
    output.key_value("Output Directory:", &config.app.output_dir);
    output.key_value("Default Timeout:", &format!("{}s", config.default_timeout().as_secs()));

    let skip_dirs: Vec<&str> = config.skip_dirs().iter().map(String::as_str).collect();
    output.key_value("Skip Directories:", &skip_dirs.join(", "));

    output.blank_line();
    let languages: Vec<&str> = config.languages().languages().collect();
    output.key_value("Supported Languages:", &languages.join(", "));

    for language in &languages {
        if let Some(tools) = config.languages().tools_for(language) {
            let names: Vec<String> = tools
                .iter()
                .map(|tool| {
                    let mut roles = Vec::new();
                    if tool.role().checks() {
                        roles.push("check");
                    }
                    if tool.role().fixes() {
                        roles.push("fix");
                    }
                    format!("{} ({})", tool.name(), roles.join("+"))
                })
                .collect();
            output.key_value(&format!("  {language}"), &names.join(", "));
        }
    }
    output.blank_line();
}
