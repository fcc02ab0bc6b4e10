use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WhatsappMessage;

#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub content: Option<String>,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
    pub is_from_me: bool,
    pub is_ai_response: bool,
}

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    instance_id: Uuid,
    contact_id: Uuid,
    msg: &NewMessage,
) -> Result<WhatsappMessage, sqlx::Error> {
    let status = if msg.is_from_me { "sent" } else { "received" };
    sqlx::query_as::<_, WhatsappMessage>(
        "INSERT INTO whatsapp_messages
            (instance_id, contact_id, content, media_type, media_url, is_from_me, is_ai_response, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(instance_id)
    .bind(contact_id)
    .bind(&msg.content)
    .bind(&msg.media_type)
    .bind(&msg.media_url)
    .bind(msg.is_from_me)
    .bind(msg.is_ai_response)
    .bind(status)
    .fetch_one(executor)
    .await
}

/// Conversation history, oldest first.
pub async fn list_for_contact(
    pool: &PgPool,
    contact_id: Uuid,
    limit: i64,
) -> Result<Vec<WhatsappMessage>, sqlx::Error> {
    sqlx::query_as::<_, WhatsappMessage>(
        "SELECT * FROM (
            SELECT * FROM whatsapp_messages WHERE contact_id = $1
            ORDER BY \"timestamp\" DESC LIMIT $2
         ) recent ORDER BY \"timestamp\" ASC",
    )
    .bind(contact_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
