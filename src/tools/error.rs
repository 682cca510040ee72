use std::io;
use std::time::Duration;
use thiserror::Error;

/// How an error affects the unit of work it occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Reported as a warning, processing continues and the gate is unaffected
    Soft,
    /// Fails the file it occurred in
    Hard,
}

/// Failures while executing an external tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{program}' not found in system path.")]
    NotFound { program: String },

    #[error("Analysis timed out after {}s", format_secs(.timeout))]
    TimedOut { timeout: Duration },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    pub fn severity(&self) -> Severity {
        match self {
            ToolError::NotFound { .. } => Severity::Soft,
            ToolError::TimedOut { .. } | ToolError::Spawn { .. } | ToolError::Io { .. } => {
                Severity::Hard
            }
        }
    }
}

/// Render a timeout the way users configure it: whole seconds when exact
pub(crate) fn format_secs(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        timeout.as_secs().to_string()
    } else {
        format!("{:.1}", timeout.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_soft() {
        let err = ToolError::NotFound {
            program: "pylint".to_string(),
        };
        assert_eq!(err.severity(), Severity::Soft);
        assert_eq!(err.to_string(), "Tool 'pylint' not found in system path.");
    }

    #[test]
    fn test_execution_failures_are_hard() {
        let timeout = ToolError::TimedOut {
            timeout: Duration::from_secs(3),
        };
        assert_eq!(timeout.severity(), Severity::Hard);
        assert_eq!(timeout.to_string(), "Analysis timed out after 3s");

        let spawn = ToolError::Spawn {
            program: "black".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(spawn.severity(), Severity::Hard);
    }

    #[test]
    fn test_fractional_timeout_formatting() {
        assert_eq!(format_secs(&Duration::from_millis(1500)), "1.5");
        assert_eq!(format_secs(&Duration::from_secs(30)), "30");
    }
}
