//! Command-line interface for Codex
//!
//! Argument parsing with clap, logging setup and dispatch to the command
//! implementations.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

pub use output::Output;

/// Codex - Concurrent code quality gate
#[derive(Parser)]
#[command(
    name = "codex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Concurrent code quality gate running linters and formatters over a source tree",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a directory tree and apply the quality gate
    Analyze(commands::analyze::AnalyzeArgs),
    /// Show the most recent runs
    History,
    /// Remove orphaned backup files left by an interrupted run
    Cleanup(commands::cleanup::CleanupArgs),
    /// Show the effective configuration
    Config,
    /// Menu-driven mode
    Interactive,
}

impl Cli {
    /// Execute the CLI command; the exit code carries the quality gate verdict
    pub async fn run(self) -> Result<ExitCode> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);
        let config_path = self.config.as_deref();

        match self.command {
            Some(Commands::Analyze(args)) => {
                let passed = commands::analyze::execute(args, config_path, output).await?;
                Ok(if passed {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                })
            }
            Some(Commands::History) => {
                commands::history::execute(config_path, &output)?;
                Ok(ExitCode::SUCCESS)
            }
            Some(Commands::Cleanup(args)) => {
                commands::cleanup::execute(args, &output)?;
                Ok(ExitCode::SUCCESS)
            }
            Some(Commands::Config) => {
                commands::config::execute(config_path, &output)?;
                Ok(ExitCode::SUCCESS)
            }
            Some(Commands::Interactive) => {
                commands::interactive::execute(config_path, output).await?;
                Ok(ExitCode::SUCCESS)
            }
            None => {
                // Show help when no command is provided
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
