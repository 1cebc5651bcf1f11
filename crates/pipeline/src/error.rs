use crate::generation::GenerationError;

/// Failures that keep a request from reaching the renderer.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error("generation backend unavailable: {0}")]
    Generation(#[from] GenerationError),

    #[error("prompt store error: {0}")]
    Store(#[from] sqlx::Error),
}
