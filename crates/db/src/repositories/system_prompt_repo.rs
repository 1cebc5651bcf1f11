//! Repository for the `system_prompts` table.

use animforge_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::system_prompt::{CreateSystemPrompt, SystemPrompt, UpdateSystemPrompt};

/// Column list for system_prompts queries.
const COLUMNS: &str = "id, name, prompt, is_active, created_at, updated_at";

/// Transaction-scoped advisory lock serializing activation changes.
const ACTIVATION_LOCK_KEY: i64 = 0x414E_494D_5350;

/// Provides CRUD and activation operations for system prompts.
pub struct SystemPromptRepo;

impl SystemPromptRepo {
    /// Insert a new system prompt. When `is_active` is set, every other
    /// prompt is deactivated in the same transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSystemPrompt,
    ) -> Result<SystemPrompt, sqlx::Error> {
        let activate = input.is_active.unwrap_or(false);
        let mut tx = pool.begin().await?;

        if activate {
            lock_activation(&mut tx).await?;
            sqlx::query("UPDATE system_prompts SET is_active = false WHERE is_active")
                .execute(&mut *tx)
                .await?;
        }

        let query = format!(
            "INSERT INTO system_prompts (name, prompt, is_active)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, SystemPrompt>(&query)
            .bind(&input.name)
            .bind(&input.prompt)
            .bind(activate)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Find a system prompt by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SystemPrompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM system_prompts WHERE id = $1");
        sqlx::query_as::<_, SystemPrompt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all prompts, the active one first, then most recently updated.
    pub async fn list(pool: &PgPool) -> Result<Vec<SystemPrompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM system_prompts
             ORDER BY is_active DESC, updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, SystemPrompt>(&query)
            .fetch_all(pool)
            .await
    }

    /// The active prompt, if any.
    pub async fn get_active(pool: &PgPool) -> Result<Option<SystemPrompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM system_prompts WHERE is_active LIMIT 1");
        sqlx::query_as::<_, SystemPrompt>(&query)
            .fetch_optional(pool)
            .await
    }

    /// Update name and/or text. Activation is left untouched.
    /// Returns `None` if the prompt does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSystemPrompt,
    ) -> Result<Option<SystemPrompt>, sqlx::Error> {
        let query = format!(
            "UPDATE system_prompts SET
                name   = COALESCE($1, name),
                prompt = COALESCE($2, prompt)
             WHERE id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SystemPrompt>(&query)
            .bind(&input.name)
            .bind(&input.prompt)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Make `id` the only active prompt.
    ///
    /// Runs in a transaction under an advisory lock: deactivate the rest,
    /// then activate the target. Returns `None` (and changes nothing) if the
    /// prompt does not exist.
    pub async fn set_active(pool: &PgPool, id: DbId) -> Result<Option<SystemPrompt>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_activation(&mut tx).await?;

        let exists: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM system_prompts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("UPDATE system_prompts SET is_active = false WHERE is_active AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "UPDATE system_prompts SET is_active = true
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let activated = sqlx::query_as::<_, SystemPrompt>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(prompt_id = id, "System prompt activated");
        Ok(Some(activated))
    }

    /// Delete an inactive prompt. Returns `true` if a row was removed;
    /// the active prompt is never deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM system_prompts WHERE id = $1 AND NOT is_active")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn lock_activation(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(ACTIVATION_LOCK_KEY)
        .execute(conn)
        .await?;
    Ok(())
}
