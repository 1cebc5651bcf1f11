//! Integration tests for the system prompt store.
//!
//! Exercises the repository against a real database:
//! - Seeded prompts and the active lookup
//! - Creating with and without activation
//! - Transactional activation switching, including concurrent switches
//! - Updates that leave activation alone
//! - Deletion refusing the active prompt

use animforge_db::models::system_prompt::{CreateSystemPrompt, UpdateSystemPrompt};
use animforge_db::repositories::SystemPromptRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_prompt(name: &str, is_active: Option<bool>) -> CreateSystemPrompt {
    CreateSystemPrompt {
        name: name.to_string(),
        prompt: format!("{name} instructions"),
        is_active,
    }
}

async fn active_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM system_prompts WHERE is_active")
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// ---- Test: seeded default is active ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn seeded_default_is_active_and_listed_first(pool: PgPool) {
    let active = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();
    assert_eq!(active.name, "Default animation prompt");

    let all = SystemPromptRepo::list(&pool).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, active.id);
    assert!(!all[1].is_active);
}

// ---- Test: saving without activation leaves the active prompt alone ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_inactive_keeps_current_active(pool: PgPool) {
    let before = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();

    let created = SystemPromptRepo::create(&pool, &new_prompt("draft", None))
        .await
        .unwrap();
    assert!(!created.is_active);

    let after = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(active_count(&pool).await, 1);
}

// ---- Test: creating an active prompt switches activation ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_active_switches_activation(pool: PgPool) {
    let created = SystemPromptRepo::create(&pool, &new_prompt("physics", Some(true)))
        .await
        .unwrap();
    assert!(created.is_active);

    let active = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();
    assert_eq!(active.id, created.id);
    assert_eq!(active_count(&pool).await, 1);
}

// ---- Test: set_active ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_active_moves_the_flag(pool: PgPool) {
    let target = SystemPromptRepo::create(&pool, &new_prompt("geometry", None))
        .await
        .unwrap();

    let activated = SystemPromptRepo::set_active(&pool, target.id)
        .await
        .unwrap()
        .unwrap();
    assert!(activated.is_active);
    assert_eq!(active_count(&pool).await, 1);

    // Activating the active prompt again is a no-op.
    SystemPromptRepo::set_active(&pool, target.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_active_unknown_id_changes_nothing(pool: PgPool) {
    let before = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();

    let result = SystemPromptRepo::set_active(&pool, 999_999).await.unwrap();
    assert!(result.is_none());

    let after = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();
    assert_eq!(after.id, before.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_activation_leaves_one_active(pool: PgPool) {
    let mut ids = Vec::new();
    for i in 0..6 {
        let p = SystemPromptRepo::create(&pool, &new_prompt(&format!("p{i}"), None))
            .await
            .unwrap();
        ids.push(p.id);
    }

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let pool = pool.clone();
            tokio::spawn(async move { SystemPromptRepo::set_active(&pool, id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap().unwrap();
    }

    assert_eq!(active_count(&pool).await, 1);
    let active = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();
    assert!(ids.contains(&active.id));
}

// ---- Test: update ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_changes_text_but_not_activation(pool: PgPool) {
    let active = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();

    let updated = SystemPromptRepo::update(
        &pool,
        active.id,
        &UpdateSystemPrompt {
            prompt: Some("Only output code.".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.prompt, "Only output code.");
    assert_eq!(updated.name, active.name);
    assert!(updated.is_active);
    assert!(updated.updated_at >= active.updated_at);

    let missing = SystemPromptRepo::update(&pool, 999_999, &UpdateSystemPrompt::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

// ---- Test: delete ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_refuses_the_active_prompt(pool: PgPool) {
    let active = SystemPromptRepo::get_active(&pool).await.unwrap().unwrap();
    assert!(!SystemPromptRepo::delete(&pool, active.id).await.unwrap());
    assert!(SystemPromptRepo::find_by_id(&pool, active.id)
        .await
        .unwrap()
        .is_some());

    let draft = SystemPromptRepo::create(&pool, &new_prompt("draft", None))
        .await
        .unwrap();
    assert!(SystemPromptRepo::delete(&pool, draft.id).await.unwrap());
    assert!(SystemPromptRepo::find_by_id(&pool, draft.id)
        .await
        .unwrap()
        .is_none());
}
