use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AiConfig, Tone};

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Default, Clone)]
pub struct AiConfigUpdate {
    pub ai_name: Option<String>,
    pub welcome_message: Option<String>,
    pub tone: Option<Tone>,
    pub formality_level: Option<i32>,
    pub allowed_emojis: Option<Vec<String>>,
    pub business_hours: Option<serde_json::Value>,
    pub knowledge_base: Option<serde_json::Value>,
    pub faqs: Option<serde_json::Value>,
    pub triggers: Option<serde_json::Value>,
}

pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<AiConfig>, sqlx::Error> {
    sqlx::query_as::<_, AiConfig>("SELECT * FROM ai_configs WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Return the user's configuration, creating the default row on first access.
pub async fn find_or_create(pool: &PgPool, user_id: Uuid) -> Result<AiConfig, sqlx::Error> {
    sqlx::query("INSERT INTO ai_configs (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;
    sqlx::query_as::<_, AiConfig>("SELECT * FROM ai_configs WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    changes: &AiConfigUpdate,
) -> Result<AiConfig, sqlx::Error> {
    find_or_create(pool, user_id).await?;
    sqlx::query_as::<_, AiConfig>(
        "UPDATE ai_configs SET
            ai_name = COALESCE($2, ai_name),
            welcome_message = COALESCE($3, welcome_message),
            tone = COALESCE($4, tone),
            formality_level = COALESCE($5, formality_level),
            allowed_emojis = COALESCE($6, allowed_emojis),
            business_hours = COALESCE($7, business_hours),
            knowledge_base = COALESCE($8, knowledge_base),
            faqs = COALESCE($9, faqs),
            triggers = COALESCE($10, triggers),
            updated_at = now()
         WHERE user_id = $1
         RETURNING *",
    )
    .bind(user_id)
    .bind(&changes.ai_name)
    .bind(&changes.welcome_message)
    .bind(changes.tone.map(|t| t.as_str()))
    .bind(changes.formality_level)
    .bind(&changes.allowed_emojis)
    .bind(&changes.business_hours)
    .bind(&changes.knowledge_base)
    .bind(&changes.faqs)
    .bind(&changes.triggers)
    .fetch_one(pool)
    .await
}

/// Replace the knowledge base wholesale; other settings are kept.
pub async fn reset_knowledge(
    pool: &PgPool,
    user_id: Uuid,
    knowledge_base: &serde_json::Value,
) -> Result<AiConfig, sqlx::Error> {
    find_or_create(pool, user_id).await?;
    sqlx::query_as::<_, AiConfig>(
        "UPDATE ai_configs SET knowledge_base = $2, updated_at = now()
         WHERE user_id = $1
         RETURNING *",
    )
    .bind(user_id)
    .bind(knowledge_base)
    .fetch_one(pool)
    .await
}
