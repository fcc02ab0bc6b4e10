use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Row shape shared by `refresh_tokens` and `password_reset_tokens`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
