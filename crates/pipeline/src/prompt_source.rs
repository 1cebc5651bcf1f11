//! Where the active system prompt comes from.

use animforge_db::repositories::SystemPromptRepo;
use animforge_db::DbPool;
use async_trait::async_trait;

use crate::error::PipelineError;

/// Source of the active system prompt text.
#[async_trait]
pub trait ActivePromptSource: Send + Sync {
    /// The active prompt text, or `None` when nothing is active.
    async fn active_prompt(&self) -> Result<Option<String>, PipelineError>;
}

/// Reads the active row from the `system_prompts` table.
pub struct DbPromptSource {
    pool: DbPool,
}

impl DbPromptSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivePromptSource for DbPromptSource {
    async fn active_prompt(&self) -> Result<Option<String>, PipelineError> {
        let active = SystemPromptRepo::get_active(&self.pool).await?;
        if let Some(prompt) = &active {
            tracing::debug!(prompt_id = prompt.id, name = %prompt.name, "Using stored system prompt");
        }
        Ok(active.map(|p| p.prompt))
    }
}

/// Fixed prompt, used when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticPromptSource(pub Option<String>);

#[async_trait]
impl ActivePromptSource for StaticPromptSource {
    async fn active_prompt(&self) -> Result<Option<String>, PipelineError> {
        Ok(self.0.clone())
    }
}
