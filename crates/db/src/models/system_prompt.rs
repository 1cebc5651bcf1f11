//! System prompt models and DTOs.
//!
//! A system prompt is the instruction text sent ahead of every generation
//! request. At most one row is active at a time.

use animforge_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `system_prompts` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SystemPrompt {
    pub id: DbId,
    pub name: String,
    pub prompt: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a system prompt. `is_active: Some(true)` activates it
/// in the same transaction, deactivating the previous one.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSystemPrompt {
    pub name: String,
    pub prompt: String,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Patch for name and text. Activation only changes through
/// `SystemPromptRepo::set_active`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSystemPrompt {
    pub name: Option<String>,
    pub prompt: Option<String>,
}
