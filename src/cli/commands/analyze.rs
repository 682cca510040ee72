use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::analyzer::{DirectoryScanner, FileProcessor, ResultAggregator};
use crate::cli::Output;
use crate::config::CodexConfig;
use crate::history::{self, HistoryManager};
use crate::reports::{self, RunSummary};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Directory to analyse
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Apply fixers before checking
    #[arg(long)]
    pub fix: bool,
}

/// Run the analysis and report; returns whether the quality gate passed
pub async fn execute(args: AnalyzeArgs, config_path: Option<&Path>, output: Output) -> Result<bool> {
    let config = Arc::new(CodexConfig::load(config_path));
    run_analysis(config, args.path, args.fix, output).await
}

pub(crate) async fn run_analysis(
    config: Arc<CodexConfig>,
    path: PathBuf,
    fix_mode: bool,
    output: Output,
) -> Result<bool> {
    let start_time = Instant::now();
    let mode = if fix_mode { "check + fix" } else { "check" };
    output.step(&format!("Analyzing {} ({mode})", path.display()));

    let scan_config = config.clone();
    let aggregate = tokio::task::spawn_blocking(move || scan(scan_config, &path, fix_mode, output))
        .await
        .context("Analysis worker stopped unexpectedly")??;

    tracing::info!(
        "Analyzed {} files in {:.2}s",
        aggregate.total(),
        start_time.elapsed().as_secs_f64()
    );

    reports::print_report(&output, &aggregate);

    match reports::export_json(aggregate.results(), Path::new(&config.app.output_dir)) {
        Ok(report_path) => {
            let shown = report_path.canonicalize().unwrap_or(report_path);
            output.info(&format!("Exported detailed report to: {}", shown.display()));
        }
        Err(e) => tracing::warn!("Failed to export JSON report: {:#}", e),
    }

    let summary = RunSummary::from_aggregator(&aggregate);
    let (trend, previous) = HistoryManager::new(&config.app.history_file).record(&summary);
    history::print_trend(&output, &summary, trend, previous.as_ref());

    Ok(summary.gate_passed())
}

/// Discover and process files, reporting progress per completed file
fn scan(config: Arc<CodexConfig>, root: &Path, fix_mode: bool, output: Output) -> Result<ResultAggregator> {
    let processor = Arc::new(FileProcessor::new(config.clone(), fix_mode));
    let scanner = DirectoryScanner::new(config, processor);

    let files = scanner.discover_files(root)?;
    if files.is_empty() {
        output.warning("No supported files found.");
    }

    if output.is_verbose() {
        scanner.scan_files(files, |result| {
            output.file_status(&result.file_path, result.success)
        })
    } else {
        let progress = output.progress_bar(files.len() as u64, "Analyzing");
        let aggregate = scanner.scan_files(files, |_| progress.inc(1));
        progress.finish_and_clear();
        aggregate
    }
}
