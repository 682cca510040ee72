use anyhow::{Result, bail};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::Output;
use crate::tools::backup::cleanup_backups;

#[derive(Args)]
pub struct CleanupArgs {
    /// Directory to sweep for orphaned backups
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

pub fn execute(args: CleanupArgs, output: &Output) -> Result<()> {
    run_cleanup(&args.path, output)
}

pub(crate) fn run_cleanup(path: &Path, output: &Output) -> Result<()> {
    if !path.exists() {
        bail!("Path does not exist: {}", path.display());
    }

    let removed = cleanup_backups(path);
    if removed > 0 {
        output.warning(&format!("[CLEANUP] Removed {removed} orphaned backup files."));
    } else {
        output.success("[CLEANUP] No orphaned backup files found.");
    }
    Ok(())
}
