//! Executor that invokes the animation renderer on a scene script.

use tokio::process::Command;

use super::executor::{ScriptError, ScriptExecutor, ScriptInput, ScriptOutput};
use super::subprocess;
use crate::config::RenderConfig;

/// Runs `<program> <quality_flag> <script_path> <args...>`.
#[derive(Debug, Clone)]
pub struct ManimRenderer {
    program: String,
    quality_flag: String,
}

impl ManimRenderer {
    pub fn new(program: impl Into<String>, quality_flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            quality_flag: quality_flag.into(),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(&config.program, &config.quality_flag)
    }
}

impl ScriptExecutor for ManimRenderer {
    async fn execute(
        &self,
        script_path: &str,
        input: ScriptInput,
    ) -> Result<ScriptOutput, ScriptError> {
        tracing::debug!(
            command = %self.command_line(script_path, &input.args),
            "Invoking renderer",
        );
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.quality_flag)
            .arg(script_path)
            .args(&input.args);
        subprocess::run_command(&mut cmd, input).await
    }

    fn command_line(&self, script_path: &str, args: &[String]) -> String {
        let mut parts = vec![self.program.as_str(), self.quality_flag.as_str(), script_path];
        parts.extend(args.iter().map(String::as_str));
        parts.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
