use anyhow::Result;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{analyze, cleanup, config};
use crate::cli::Output;
use crate::config::CodexConfig;
use crate::history::HistoryManager;

#[derive(Debug, Clone, Copy)]
enum MenuAction {
    Analyze,
    AnalyzeAndFix,
    History,
    Cleanup,
    ConfigInfo,
    Exit,
}

const MENU: [(&str, MenuAction); 6] = [
    ("Analyze directory", MenuAction::Analyze),
    ("Analyze and auto-fix", MenuAction::AnalyzeAndFix),
    ("View history", MenuAction::History),
    ("Clean up backup files", MenuAction::Cleanup),
    ("Show configuration", MenuAction::ConfigInfo),
    ("Exit", MenuAction::Exit),
];

/// Menu loop; analyses run in verbose mode like the `-v` flag
pub async fn execute(config_path: Option<&Path>, output: Output) -> Result<()> {
    let theme = ColorfulTheme::default();
    let labels: Vec<&str> = MENU.iter().map(|(label, _)| *label).collect();
    let run_output = Output::new(true, output.is_quiet());

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("Select an option")
            .items(&labels)
            .default(0)
            .interact()?;

        match MENU[selection].1 {
            MenuAction::Analyze | MenuAction::AnalyzeAndFix => {
                let fix_mode = matches!(MENU[selection].1, MenuAction::AnalyzeAndFix);
                let path = prompt_path(&theme, "Enter path to analyze")?;
                let config = Arc::new(CodexConfig::load(config_path));
                // A failed analysis returns to the menu
                if let Err(e) = analyze::run_analysis(config, path, fix_mode, run_output).await {
                    output.error(&format!("[FATAL] Analysis failed: {e:#}"));
                }
            }
            MenuAction::History => {
                let config = CodexConfig::load(config_path);
                HistoryManager::new(&config.app.history_file).display(&output);
            }
            MenuAction::Cleanup => {
                let path = prompt_path(&theme, "Enter path to clean")?;
                if let Err(e) = cleanup::run_cleanup(&path, &output) {
                    output.error(&format!("{e:#}"));
                }
            }
            MenuAction::ConfigInfo => config::show(&CodexConfig::load(config_path), &output),
            MenuAction::Exit => {
                output.info("Thank you for using Codex!");
                return Ok(());
            }
        }
    }
}

fn prompt_path(theme: &ColorfulTheme, prompt: &str) -> Result<PathBuf> {
    let path: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(".".to_string())
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}
