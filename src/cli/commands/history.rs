use anyhow::Result;
use std::path::Path;

use crate::cli::Output;
use crate::config::CodexConfig;
use crate::history::HistoryManager;

pub fn execute(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = CodexConfig::load(config_path);
    HistoryManager::new(&config.app.history_file).display(output);
    Ok(())
}
