//! Drives one prepared script through the renderer.
//!
//! `Prepared -> Invoked -> {Succeeded | Failed | TimedOut} -> Resolved`.
//! Every failure resolves through the [`DiagnosticArtifactProducer`], so a
//! caller only sees `failed` when even the placeholder cannot be written.

use std::path::{Path, PathBuf};

use chrono::Utc;

use super::diagnostics::{self, EXCERPT_BYTES};
use super::discovery;
use super::execution::{ExecutionId, ExecutionResult, RenderAttempt};
use super::RenderFailure;
use crate::config::RenderConfig;
use crate::fallback::DiagnosticArtifactProducer;
use crate::script::{self, scene};
use crate::scripting::executor::{ScriptError, ScriptExecutor, ScriptInput, ScriptOutput};

/// Renderer re-runs allowed after a self-repair pass.
pub const MAX_SELF_REPAIR_RETRIES: u32 = 1;

pub struct RenderOrchestrator<E, P> {
    config: RenderConfig,
    executor: E,
    fallback: P,
}

impl<E, P> RenderOrchestrator<E, P>
where
    E: ScriptExecutor,
    P: DiagnosticArtifactProducer,
{
    pub fn new(config: RenderConfig, executor: E, fallback: P) -> Self {
        Self {
            config,
            executor,
            fallback,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `script` for `request_id`.
    pub async fn run(&self, request_id: &str, script: &str) -> ExecutionResult {
        self.run_recorded(request_id, script).await.0
    }

    /// Like [`run`](Self::run), also returning every renderer attempt.
    pub async fn run_recorded(
        &self,
        request_id: &str,
        script: &str,
    ) -> (ExecutionResult, Vec<RenderAttempt>) {
        let execution_id = ExecutionId::new(request_id);
        let mut attempts = Vec::new();
        tracing::info!(%execution_id, "Execution started");

        let result = match self.render(&execution_id, script, &mut attempts).await {
            Ok(artifact) => {
                tracing::info!(
                    %execution_id,
                    path = %artifact.display(),
                    attempts = attempts.len(),
                    "Execution completed",
                );
                ExecutionResult::completed(execution_id, artifact)
            }
            Err(failure) => self.resolve_failure(execution_id, failure).await,
        };
        (result, attempts)
    }

    async fn render(
        &self,
        execution_id: &ExecutionId,
        script: &str,
        attempts: &mut Vec<RenderAttempt>,
    ) -> Result<PathBuf, RenderFailure> {
        let scene = scene::extract_scene(script).map_err(|_| RenderFailure::NoScene)?;
        self.config.ensure_media_dirs().await?;

        let stem = format!("animation_{execution_id}");
        let script_path = self.config.temp_dir().join(format!("{stem}.py"));
        tokio::fs::write(&script_path, script).await?;
        tracing::debug!(
            %execution_id,
            entry = %scene.entry_name,
            base = %scene.base_kind,
            "Script prepared",
        );

        let mut retries = 0;
        loop {
            let output = self
                .invoke(execution_id, &script_path, &scene.entry_name, attempts)
                .await?;
            if output.success() {
                break;
            }

            let diagnosis = diagnostics::classify(&output.stderr);
            let failure = RenderFailure::NonZeroExit {
                class: diagnosis.class,
                exit_code: output.exit_code,
                detail: diagnosis.detail,
            };
            if !diagnosis.class.is_self_repairable() || retries >= MAX_SELF_REPAIR_RETRIES {
                return Err(failure);
            }
            if !self.self_repair(&script_path, &output.stderr).await? {
                tracing::info!(%execution_id, "Self-repair made no fixes, not retrying");
                return Err(failure);
            }
            retries += 1;
            tracing::info!(%execution_id, attempt = retries + 1, "Retrying render after self-repair");
        }

        let found = discovery::discover(
            &self.config.videos_dir(),
            &stem,
            self.config.quality_dir(),
            &scene.entry_name,
        )
        .await
        .ok_or(RenderFailure::ArtifactNotFound)?;
        tracing::debug!(%execution_id, tier = ?found.tier, path = %found.path.display(), "Rendered video found");

        let artifact = self.config.artifact_path(execution_id.request_id());
        tokio::fs::copy(&found.path, &artifact).await?;
        if let Some(last) = attempts.last_mut() {
            last.artifact_path = Some(artifact.clone());
        }
        Ok(artifact)
    }

    /// One renderer invocation, recorded as a [`RenderAttempt`].
    async fn invoke(
        &self,
        execution_id: &ExecutionId,
        script_path: &Path,
        entry_name: &str,
        attempts: &mut Vec<RenderAttempt>,
    ) -> Result<ScriptOutput, RenderFailure> {
        // The renderer runs inside the work dir, so hand it a relative path.
        let relative = script_path
            .strip_prefix(&self.config.work_dir)
            .unwrap_or(script_path);
        let script_arg = relative.to_string_lossy().into_owned();
        let input = ScriptInput {
            args: vec![entry_name.to_string()],
            env_vars: vec![],
            working_directory: Some(self.config.work_dir.clone()),
            timeout: self.config.timeout,
        };
        let command = self.executor.command_line(&script_arg, &input.args);

        let started_at = Utc::now();
        let outcome = self.executor.execute(&script_arg, input).await;
        let ended_at = Utc::now();

        let (exit_code, stderr_excerpt) = match &outcome {
            Ok(output) => (
                Some(output.exit_code),
                diagnostics::tail_excerpt(&output.stderr, EXCERPT_BYTES).to_string(),
            ),
            Err(e) => (None, e.to_string()),
        };
        tracing::info!(
            %execution_id,
            attempt = attempts.len() + 1,
            exit_code = ?exit_code,
            elapsed_ms = (ended_at - started_at).num_milliseconds(),
            "Renderer attempt finished",
        );
        attempts.push(RenderAttempt {
            execution_id: execution_id.clone(),
            command,
            started_at,
            ended_at,
            exit_code,
            stderr_excerpt,
            artifact_path: None,
        });

        outcome.map_err(|e| match e {
            ScriptError::Timeout { elapsed_ms } => RenderFailure::Timeout { elapsed_ms },
            ScriptError::IoError(io) => RenderFailure::Io(io),
            other => RenderFailure::Unavailable(other.to_string()),
        })
    }

    /// Re-run the repair pass on the scratch file using the interpreter's
    /// complaint. Returns whether anything was fixed.
    async fn self_repair(&self, script_path: &Path, stderr: &str) -> Result<bool, RenderFailure> {
        let current = tokio::fs::read_to_string(script_path).await?;
        let hints: Vec<&str> = diagnostics::undefined_name(stderr).into_iter().collect();
        let prepared =
            script::prepare_with_runtime_hints(&current, self.config.avoid_latex, &hints);
        if prepared.fixes == 0 {
            return Ok(false);
        }
        tokio::fs::write(script_path, &prepared.script).await?;
        Ok(true)
    }

    async fn resolve_failure(
        &self,
        execution_id: ExecutionId,
        failure: RenderFailure,
    ) -> ExecutionResult {
        let diagnostic = failure.diagnostic();
        tracing::warn!(%execution_id, %diagnostic, "Render failed, producing placeholder");

        let message = failure.to_string();
        let detail = failure.detail();
        match self
            .fallback
            .produce(&execution_id, &message, detail.as_deref())
            .await
        {
            Some(path) => ExecutionResult::placeholder(execution_id, path, diagnostic),
            None => {
                tracing::error!(%execution_id, "Placeholder could not be produced");
                ExecutionResult::failed(execution_id, diagnostic)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::render::execution::ExecutionStatus;

    /// What the fake renderer does on one call.
    enum Step {
        /// Exit with `code`; on success optionally write the scene video
        /// into the given quality dir.
        Exit {
            code: i32,
            stderr: &'static str,
            video_in: Option<&'static str>,
        },
        Timeout,
        Missing,
    }

    #[derive(Clone, Default)]
    struct FakeRenderer {
        calls: Arc<AtomicUsize>,
        steps: Arc<Mutex<VecDeque<Step>>>,
    }

    impl FakeRenderer {
        fn with_steps(steps: Vec<Step>) -> Self {
            Self {
                calls: Arc::default(),
                steps: Arc::new(Mutex::new(steps.into())),
            }
        }
    }

    impl ScriptExecutor for FakeRenderer {
        async fn execute(
            &self,
            script_path: &str,
            input: ScriptInput,
        ) -> Result<ScriptOutput, ScriptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().unwrap().pop_front();
            match step.expect("unexpected renderer call") {
                Step::Exit {
                    code,
                    stderr,
                    video_in,
                } => {
                    if let Some(quality) = video_in {
                        let stem = Path::new(script_path).file_stem().unwrap();
                        let video = input
                            .working_directory
                            .unwrap()
                            .join("media/videos")
                            .join(stem)
                            .join(quality)
                            .join(format!("{}.mp4", input.args[0]));
                        tokio::fs::create_dir_all(video.parent().unwrap())
                            .await
                            .unwrap();
                        tokio::fs::write(&video, b"video").await.unwrap();
                    }
                    Ok(ScriptOutput {
                        stdout: String::new(),
                        stderr: stderr.to_string(),
                        exit_code: code,
                        duration_ms: 1,
                    })
                }
                Step::Timeout => Err(ScriptError::Timeout { elapsed_ms: 120_000 }),
                Step::Missing => Err(ScriptError::NotFound("manim".into())),
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingFallback {
        calls: Arc<Mutex<Vec<(String, Option<String>)>>>,
        unavailable: bool,
    }

    impl DiagnosticArtifactProducer for RecordingFallback {
        async fn produce(
            &self,
            execution_id: &ExecutionId,
            message: &str,
            detail: Option<&str>,
        ) -> Option<PathBuf> {
            self.calls
                .lock()
                .unwrap()
                .push((message.to_string(), detail.map(str::to_string)));
            (!self.unavailable)
                .then(|| PathBuf::from(format!("frame_{}.png", execution_id.request_id())))
        }
    }

    const INTRO: &str = "\
from manim import *

class Intro(Scene):
    def construct(self):
        self.play(Write(Title))
";

    const NAME_ERROR: &str = "Traceback (most recent call last):\nNameError: name 'Title' is not defined\n";

    fn orchestrator(
        dir: &Path,
        renderer: &FakeRenderer,
        fallback: &RecordingFallback,
    ) -> RenderOrchestrator<FakeRenderer, RecordingFallback> {
        RenderOrchestrator::new(
            RenderConfig::with_work_dir(dir),
            renderer.clone(),
            fallback.clone(),
        )
    }

    fn fallback_messages(fallback: &RecordingFallback) -> Vec<String> {
        fallback
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    // ---- Test: successful render lands in the canonical slot ----

    #[tokio::test]
    async fn rendered_video_is_copied_to_artifact_slot() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![Step::Exit {
            code: 0,
            stderr: "",
            video_in: Some("480p15"),
        }]);
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        let (result, attempts) = orch.run_recorded("17", INTRO).await;
        assert!(result.is_rendered());
        assert_eq!(
            attempts[0].command,
            format!("media/temp/animation_{}.py Intro", result.execution_id)
        );
        let artifact = result.artifact_path.unwrap();
        assert!(artifact.ends_with("media/animations/animation_17.mp4"));
        assert!(artifact.exists());
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].exit_code, Some(0));
        assert_eq!(attempts[0].artifact_path.as_ref(), Some(&artifact));
        assert!(fallback_messages(&fallback).is_empty());
    }

    // ---- Test: missing scene class never reaches the renderer ----

    #[tokio::test]
    async fn script_without_scene_goes_straight_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::default();
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        let result = orch.run("3", "from manim import *\ncircle = Circle()\n").await;
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fallback_messages(&fallback), vec!["no scene class found"]);
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.artifact_path, Some(PathBuf::from("frame_3.png")));
        assert_eq!(result.diagnostic.as_deref(), Some("no scene class found"));
    }

    // ---- Test: clean exit with no video resolves to a placeholder ----

    #[tokio::test]
    async fn missing_output_resolves_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![Step::Exit {
            code: 0,
            stderr: "",
            video_in: None,
        }]);
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        let result = orch.run("5", INTRO).await;
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.artifact_path, Some(PathBuf::from("frame_5.png")));
        assert_eq!(fallback_messages(&fallback), vec!["rendered video not found"]);
    }

    // ---- Test: undefined name earns one self-repair retry ----

    #[tokio::test]
    async fn name_error_is_repaired_and_retried_once() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![
            Step::Exit {
                code: 1,
                stderr: NAME_ERROR,
                video_in: None,
            },
            Step::Exit {
                code: 0,
                stderr: "",
                video_in: Some("720p30"),
            },
        ]);
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        let (result, attempts) = orch.run_recorded("8", INTRO).await;
        assert!(result.is_rendered());
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].exit_code, Some(1));
        assert!(attempts[0].stderr_excerpt.contains("NameError"));

        let scratch = dir
            .path()
            .join("media/temp")
            .join(format!("animation_{}.py", result.execution_id));
        let repaired = tokio::fs::read_to_string(scratch).await.unwrap();
        assert!(repaired.contains("        Title = 1  #"));
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![
            Step::Exit {
                code: 1,
                stderr: NAME_ERROR,
                video_in: None,
            },
            Step::Exit {
                code: 1,
                stderr: NAME_ERROR,
                video_in: None,
            },
        ]);
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        let result = orch.run("9", INTRO).await;
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fallback_messages(&fallback), vec!["undefined name"]);
        assert_eq!(
            result.diagnostic.as_deref(),
            Some("undefined name: name 'Title' is not defined")
        );
    }

    #[tokio::test]
    async fn retry_is_skipped_when_repair_fixes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![Step::Exit {
            code: 1,
            stderr: "NameError: name 'ghost' is not defined\n",
            video_in: None,
        }]);
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        orch.run("10", INTRO).await;
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_messages(&fallback), vec!["undefined name"]);
    }

    #[tokio::test]
    async fn other_failure_classes_are_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![Step::Exit {
            code: 1,
            stderr: "TypeError: unsupported operand\n",
            video_in: None,
        }]);
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        orch.run("11", INTRO).await;
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        let calls = fallback.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("type mismatch".to_string(), Some("unsupported operand".to_string()))]
        );
    }

    // ---- Test: timeout and spawn failure diagnostics ----

    #[tokio::test]
    async fn timeout_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![Step::Timeout]);
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        let (result, attempts) = orch.run_recorded("12", INTRO).await;
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(attempts[0].exit_code, None);
        assert_eq!(fallback_messages(&fallback), vec!["render timed out"]);
        assert_eq!(result.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn missing_renderer_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![Step::Missing]);
        let fallback = RecordingFallback::default();
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        orch.run("13", INTRO).await;
        assert_eq!(fallback_messages(&fallback), vec!["renderer unavailable"]);
    }

    #[tokio::test]
    async fn failed_placeholder_reports_failed() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::with_steps(vec![Step::Missing]);
        let fallback = RecordingFallback {
            unavailable: true,
            ..Default::default()
        };
        let orch = orchestrator(dir.path(), &renderer, &fallback);

        let result = orch.run("14", INTRO).await;
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(result.artifact_path.is_none());
        assert_eq!(
            result.diagnostic.as_deref(),
            Some("renderer unavailable: Program not found: manim")
        );
    }
}
