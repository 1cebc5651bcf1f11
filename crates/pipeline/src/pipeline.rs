//! One request, end to end: validate, generate, prepare, render.

use std::sync::Arc;

use animforge_core::fallback::DiagnosticArtifactProducer;
use animforge_core::render::execution::{ExecutionId, ExecutionResult};
use animforge_core::render::orchestrator::RenderOrchestrator;
use animforge_core::script;
use animforge_core::scripting::executor::ScriptExecutor;
use validator::Validate;

use crate::error::PipelineError;
use crate::generation::GenerationBackend;
use crate::prompt_source::ActivePromptSource;
use crate::prompts::{self, DEFAULT_SYSTEM_PROMPT};
use crate::request::GenerationRequest;

pub struct AnimationPipeline<E, P> {
    backend: Arc<dyn GenerationBackend>,
    prompts: Arc<dyn ActivePromptSource>,
    orchestrator: RenderOrchestrator<E, P>,
}

impl<E, P> AnimationPipeline<E, P>
where
    E: ScriptExecutor,
    P: DiagnosticArtifactProducer,
{
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        prompts: Arc<dyn ActivePromptSource>,
        orchestrator: RenderOrchestrator<E, P>,
    ) -> Self {
        Self {
            backend,
            prompts,
            orchestrator,
        }
    }

    /// Run `request` through generation and rendering.
    ///
    /// Rendering problems always resolve to `completed` (possibly with a
    /// placeholder); only an invalid request or an unreachable generation
    /// backend yields `failed`.
    pub async fn generate(&self, request: &GenerationRequest) -> ExecutionResult {
        match self.generate_script(request).await {
            Ok(script) => self.orchestrator.run(&request.request_id, &script).await,
            Err(e) => {
                tracing::error!(request_id = %request.request_id, error = %e, "Request failed before rendering");
                ExecutionResult::failed(ExecutionId::new(&request.request_id), e.to_string())
            }
        }
    }

    /// Generate and repair the script for `request`.
    pub async fn generate_script(&self, request: &GenerationRequest) -> Result<String, PipelineError> {
        request.validate()?;

        let system_prompt = self.system_prompt().await;
        let user_prompt = prompts::user_prompt(&request.prompt);
        let raw = self.backend.generate(&system_prompt, &user_prompt).await?;
        let code = prompts::ensure_manim_import(&raw, &request.prompt);

        let prepared = script::prepare(&code, self.orchestrator.config().avoid_latex);
        tracing::info!(
            request_id = %request.request_id,
            anchor = ?prepared.anchor,
            issues = prepared.issues.len(),
            fixes = prepared.fixes,
            residual = prepared.residual.len(),
            "Generated script prepared",
        );
        Ok(prepared.script)
    }

    /// Active stored prompt, or the built-in default when none is active or
    /// the store cannot be read.
    async fn system_prompt(&self) -> String {
        match self.prompts.active_prompt().await {
            Ok(Some(prompt)) if !prompt.trim().is_empty() => prompt,
            Ok(_) => {
                tracing::debug!("No active system prompt, using the default");
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load system prompt, using the default");
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
