//! Execution seam for the renderer subprocess.
//!
//! Defines [`ScriptExecutor`], implemented by the real renderer and by test
//! doubles, along with [`ScriptInput`], [`ScriptOutput`], and [`ScriptError`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Invocation parameters for one execution.
#[derive(Debug, Clone)]
pub struct ScriptInput {
    /// Arguments appended after the script path.
    pub args: Vec<String>,
    /// Additional environment variables set for the child process.
    pub env_vars: Vec<(String, String)>,
    /// Working directory for the child process (uses current dir if `None`).
    pub working_directory: Option<PathBuf>,
    /// Maximum wall-clock time before the process is killed.
    pub timeout: Duration,
}

/// Captured output from an execution that ran to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors that prevent an execution from producing a [`ScriptOutput`].
#[derive(Debug)]
pub enum ScriptError {
    /// The program (or script) could not be found.
    NotFound(String),
    /// The program exists but cannot be executed.
    PermissionDenied(String),
    /// The process exceeded its configured timeout and was killed.
    Timeout {
        /// Elapsed wall-clock time before the process was killed.
        elapsed_ms: u64,
    },
    /// An I/O error occurred while spawning or communicating with the process.
    IoError(std::io::Error),
}

impl ScriptError {
    /// The process never started.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::PermissionDenied(_))
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Program not found: {path}"),
            Self::PermissionDenied(path) => write!(f, "Permission denied: {path}"),
            Self::Timeout { elapsed_ms } => {
                write!(f, "Process timed out after {elapsed_ms}ms")
            }
            Self::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

/// Trait implemented by anything that can run a scene script.
///
/// A non-zero exit is not an error: it comes back as a [`ScriptOutput`] so
/// the caller can classify the captured stderr.
pub trait ScriptExecutor: Send + Sync {
    /// Execute the script at `script_path` with the given `input`.
    fn execute(
        &self,
        script_path: &str,
        input: ScriptInput,
    ) -> impl std::future::Future<Output = Result<ScriptOutput, ScriptError>> + Send;

    /// The command `execute` would run, for logs and attempt records.
    fn command_line(&self, script_path: &str, args: &[String]) -> String {
        let mut parts = vec![script_path];
        parts.extend(args.iter().map(String::as_str));
        parts.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_found() {
        let err = ScriptError::NotFound("manim".to_string());
        assert_eq!(err.to_string(), "Program not found: manim");
    }

    #[test]
    fn display_timeout() {
        let err = ScriptError::Timeout { elapsed_ms: 5000 };
        assert_eq!(err.to_string(), "Process timed out after 5000ms");
    }

    #[test]
    fn spawn_failures_are_distinguished() {
        assert!(ScriptError::NotFound("x".into()).is_spawn_failure());
        assert!(ScriptError::PermissionDenied("x".into()).is_spawn_failure());
        assert!(!ScriptError::Timeout { elapsed_ms: 1 }.is_spawn_failure());
    }

    #[test]
    fn error_source_io() {
        let err = ScriptError::IoError(std::io::Error::other("boom"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&ScriptError::Timeout { elapsed_ms: 1 }).is_none());
    }
}
