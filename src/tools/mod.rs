//! External tool execution
//!
//! This module runs one checker or fixer against one file. Every invocation is
//! bounded by a timeout, captures stdout/stderr with lossy decoding and, for
//! fixers, is wrapped in a backup/rollback so a failed fix never leaves a
//! half-rewritten file behind.

use crossbeam::channel::{Receiver, RecvTimeoutError, bounded};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ToolSpec;

pub mod backup;
pub mod error;


pub use backup::{BACKUP_SUFFIX, BackupHandle, cleanup_backups};
pub use error::{Severity, ToolError};

/// How often a running tool is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Minimum time given to flush output pipes after a tool exits near its deadline
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Outcome of a single tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    /// Exit code 0
    Success,
    /// The tool's own non-zero exit code
    Failed(i32),
    /// Executable not on the search path, the tool was never started
    NotFound,
    /// Killed after exceeding its timeout
    TimedOut,
    /// Spawn or I/O failure
    ExecutionError,
}

impl ToolExit {
    pub const NOT_FOUND_CODE: i32 = -1;
    pub const TIMEOUT_CODE: i32 = -2;
    pub const EXECUTION_ERROR_CODE: i32 = -3;

    /// Numeric code as reported to users
    pub fn code(self) -> i32 {
        match self {
            ToolExit::Success => 0,
            ToolExit::Failed(code) => code,
            ToolExit::NotFound => Self::NOT_FOUND_CODE,
            ToolExit::TimedOut => Self::TIMEOUT_CODE,
            ToolExit::ExecutionError => Self::EXECUTION_ERROR_CODE,
        }
    }

    pub fn is_success(self) -> bool {
        self == ToolExit::Success
    }

    /// Severity of a non-successful outcome, `None` on success
    pub fn severity(self) -> Option<Severity> {
        match self {
            ToolExit::Success => None,
            ToolExit::NotFound => Some(Severity::Soft),
            ToolExit::Failed(_) | ToolExit::TimedOut | ToolExit::ExecutionError => {
                Some(Severity::Hard)
            }
        }
    }
}

/// Captured result of running a tool
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit: ToolExit,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    fn new(exit: ToolExit, stdout: String, stderr: String) -> Self {
        Self {
            exit,
            stdout,
            stderr,
        }
    }

    pub fn code(&self) -> i32 {
        self.exit.code()
    }
}

/// Raw process result before fixer bookkeeping
struct Captured {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

/// Runs tools against files
#[derive(Debug, Clone)]
pub struct ToolRunner {
    default_timeout: Duration,
    poll_interval: Duration,
}

impl ToolRunner {
    /// Create a runner; `default_timeout` applies to specs without their own
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Run `spec` with `file` appended as the last argument
    ///
    /// With `as_fixer` the file is backed up first and restored whenever the tool
    /// does not exit cleanly. This never fails: every problem is folded into the
    /// returned [`ToolOutput`].
    pub fn run(&self, file: &Path, spec: &ToolSpec, as_fixer: bool) -> ToolOutput {
        let program = match which::which(spec.program()) {
            Ok(program) => program,
            Err(_) => {
                let err = ToolError::NotFound {
                    program: spec.program().to_string(),
                };
                tracing::debug!("{}", err);
                return ToolOutput::new(ToolExit::NotFound, String::new(), err.to_string());
            }
        };

        let timeout = spec.timeout().unwrap_or(self.default_timeout);

        // Best effort: a missing backup only turns a later rollback into a no-op
        let backup = if as_fixer {
            match BackupHandle::create(file) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::debug!("Could not back up {}: {}", file.display(), e);
                    None
                }
            }
        } else {
            None
        };

        tracing::debug!(
            tool = spec.name(),
            file = %file.display(),
            fixer = as_fixer,
            "running tool"
        );

        match self.execute(&program, file, spec, timeout) {
            Ok(captured) => Self::finish(file, spec, captured, backup),
            Err(err @ ToolError::TimedOut { .. }) => {
                tracing::warn!("{} timed out on {}", spec.name(), file.display());
                let stderr = if rollback(backup) {
                    format!("{err} and rolled back.")
                } else {
                    format!("{err}.")
                };
                ToolOutput::new(ToolExit::TimedOut, String::new(), stderr)
            }
            Err(err) => {
                tracing::warn!("{} failed on {}: {}", spec.name(), file.display(), err);
                let stderr = if rollback(backup) {
                    format!("Tool execution failed and rolled back: {err}")
                } else {
                    format!("Tool execution failed: {err}")
                };
                ToolOutput::new(ToolExit::ExecutionError, String::new(), stderr)
            }
        }
    }

    fn finish(
        file: &Path,
        spec: &ToolSpec,
        captured: Captured,
        backup: Option<BackupHandle>,
    ) -> ToolOutput {
        let Captured {
            status,
            stdout,
            mut stderr,
        } = captured;

        let exit = match status.code() {
            Some(0) => ToolExit::Success,
            Some(code) => ToolExit::Failed(code),
            None => {
                stderr = format!("Tool terminated by signal. {stderr}");
                ToolExit::ExecutionError
            }
        };

        if exit.is_success() {
            if let Some(handle) = backup
                && let Err(e) = handle.discard()
            {
                tracing::warn!("Could not remove backup for {}: {}", file.display(), e);
            }
        } else if rollback(backup) {
            tracing::info!("{} failed on {}, changes rolled back", spec.name(), file.display());
            stderr = format!("Fix failed; rolled back changes. {stderr}");
        }

        ToolOutput::new(exit, stdout, stderr)
    }

    fn execute(
        &self,
        program: &Path,
        file: &Path,
        spec: &ToolSpec,
        timeout: Duration,
    ) -> Result<Captured, ToolError> {
        let target = std::path::absolute(file).map_err(|source| ToolError::Io {
            program: spec.program().to_string(),
            source,
        })?;
        let workdir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut command = Command::new(program);
        command
            .args(spec.command().iter().skip(1))
            .arg(&target)
            .current_dir(&workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout can take down everything the tool started
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| ToolError::Spawn {
            program: spec.program().to_string(),
            source,
        })?;
        let deadline = Instant::now() + timeout;

        // Drain both pipes concurrently so a chatty tool never blocks on a full buffer
        let stdout = PipeReader::spawn(child.stdout.take());
        let stderr = PipeReader::spawn(child.stderr.take());

        // On timeout the reader threads are left detached: a grandchild of the
        // tool may still hold the pipes open
        let status = self.wait_for_exit(&mut child, deadline, timeout)?;

        // A background process started by the tool can keep the pipes open after
        // the tool itself exits; it gets whatever is left of the timeout
        let drain_deadline = deadline.max(Instant::now() + DRAIN_GRACE);
        let drained = [&stdout, &stderr]
            .into_iter()
            .flatten()
            .all(|reader| reader.wait_until(drain_deadline));
        if !drained {
            tracing::warn!(
                "{} exited but its output was still held open at the deadline; stopping leftover processes",
                spec.name()
            );
            #[cfg(unix)]
            kill_process_group(child.id());
        }

        Ok(Captured {
            status,
            stdout: PipeReader::contents(stdout.as_ref()),
            stderr: PipeReader::contents(stderr.as_ref()),
        })
    }

    fn wait_for_exit(
        &self,
        child: &mut Child,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<ExitStatus, ToolError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        terminate(child);
                        return Err(ToolError::TimedOut { timeout });
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(source) => {
                    terminate(child);
                    return Err(ToolError::Io {
                        program: format!("pid {}", child.id()),
                        source,
                    });
                }
            }
        }
    }
}

/// Kill the tool along with its process group, then reap it
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    kill_process_group(child.id());
    child.kill().ok();
    child.wait().ok();
}

/// Send SIGKILL to every process in the group led by `pgid`
#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let result = unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
    if result != 0 {
        tracing::debug!(
            "Could not signal process group {}: {}",
            pgid,
            io::Error::last_os_error()
        );
    }
}

/// Restore a fixer backup if one exists; returns whether the file was restored
fn rollback(backup: Option<BackupHandle>) -> bool {
    let Some(handle) = backup else {
        return false;
    };
    match handle.restore() {
        Ok(restored) => restored,
        Err(e) => {
            tracing::error!("Rollback failed: {}", e);
            false
        }
    }
}

/// Background reader collecting one output pipe
///
/// Bytes are appended to a shared buffer as they arrive, so whatever was read
/// is still available when the pipe never closes.
struct PipeReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

impl PipeReader {
    fn spawn<R>(pipe: Option<R>) -> Option<Self>
    where
        R: Read + Send + 'static,
    {
        let mut pipe = pipe?;
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done) = bounded(1);

        let sink = buffer.clone();
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            done_tx.send(()).ok();
        });

        Some(Self { buffer, done })
    }

    /// Wait for the pipe to close; `false` if it is still open at `deadline`
    fn wait_until(&self, deadline: Instant) -> bool {
        let remaining = deadline.saturating_duration_since(Instant::now());
        !matches!(self.done.recv_timeout(remaining), Err(RecvTimeoutError::Timeout))
    }

    /// Bytes read so far, replacing invalid UTF-8
    fn contents(reader: Option<&Self>) -> String {
        reader
            .map(|reader| {
                let bytes = reader.buffer.lock().unwrap_or_else(PoisonError::into_inner);
                String::from_utf8_lossy(&bytes).into_owned()
            })
            .unwrap_or_default()
    }
}
