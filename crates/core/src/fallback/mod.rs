//! Diagnostic artifacts that stand in for a failed render.

pub mod placeholder;

use std::path::PathBuf;

use crate::render::execution::ExecutionId;

/// Produces a viewable artifact describing why a render failed.
pub trait DiagnosticArtifactProducer: Send + Sync {
    /// Returns the artifact path, or `None` when nothing could be written.
    fn produce(
        &self,
        execution_id: &ExecutionId,
        message: &str,
        detail: Option<&str>,
    ) -> impl std::future::Future<Output = Option<PathBuf>> + Send;
}
