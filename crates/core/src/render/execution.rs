//! Execution identity, attempt records and the final result.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::types::Timestamp;

/// Unique identifier of one orchestrated execution:
/// `<request_id>_<8 hex chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Derive a fresh execution id for `request_id`.
    pub fn new(request_id: &str) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{request_id}_{}", &suffix[..8]))
    }

    /// The request id the execution belongs to.
    pub fn request_id(&self) -> &str {
        self.0.rsplit_once('_').map_or(&self.0, |(request, _)| request)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record of one renderer invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RenderAttempt {
    pub execution_id: ExecutionId,
    pub command: String,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    /// `None` when the process never started or was killed on timeout.
    pub exit_code: Option<i32>,
    pub stderr_excerpt: String,
    pub artifact_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Completed,
    Failed,
}

/// Outcome reported to the caller.
///
/// `Completed` always carries an artifact; it may be a diagnostic
/// placeholder, in which case `diagnostic` is set.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub artifact_path: Option<PathBuf>,
    pub diagnostic: Option<String>,
    pub execution_id: ExecutionId,
}

impl ExecutionResult {
    pub fn completed(execution_id: ExecutionId, artifact: PathBuf) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            artifact_path: Some(artifact),
            diagnostic: None,
            execution_id,
        }
    }

    /// Completed with a placeholder artifact standing in for the render.
    pub fn placeholder(execution_id: ExecutionId, artifact: PathBuf, diagnostic: String) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            artifact_path: Some(artifact),
            diagnostic: Some(diagnostic),
            execution_id,
        }
    }

    pub fn failed(execution_id: ExecutionId, diagnostic: String) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            artifact_path: None,
            diagnostic: Some(diagnostic),
            execution_id,
        }
    }

    /// Completed with the real render, not a placeholder.
    pub fn is_rendered(&self) -> bool {
        self.status == ExecutionStatus::Completed && self.diagnostic.is_none()
    }
}
