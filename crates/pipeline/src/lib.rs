//! End-to-end request handling: prompt assembly, script generation and
//! rendering.
//!
//! [`pipeline::AnimationPipeline`] ties a [`generation::GenerationBackend`]
//! and an [`prompt_source::ActivePromptSource`] to the core render
//! orchestrator.

pub mod error;
pub mod generation;
pub mod pipeline;
pub mod prompt_source;
pub mod prompts;
pub mod request;

pub use error::PipelineError;
pub use pipeline::AnimationPipeline;
pub use request::GenerationRequest;
