use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    Tone ("tone") {
        Friendly => "friendly",
        Professional => "professional",
        Casual => "casual",
        Formal => "formal",
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AiConfig {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ai_name: String,
    pub welcome_message: String,
    pub tone: String,
    pub formality_level: i32,
    pub allowed_emojis: Vec<String>,
    pub business_hours: Option<serde_json::Value>,
    pub knowledge_base: Option<serde_json::Value>,
    pub faqs: Option<serde_json::Value>,
    pub triggers: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
