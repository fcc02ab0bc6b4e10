use sqlx::PgPool;
use uuid::Uuid;

use crate::models::SystemLog;

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Option<Uuid>,
    action: &str,
    details: Option<serde_json::Value>,
    ip_address: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO system_logs (user_id, action, details, ip_address)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(action)
    .bind(details)
    .bind(ip_address)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<SystemLog>, sqlx::Error> {
    sqlx::query_as::<_, SystemLog>(
        "SELECT * FROM system_logs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
