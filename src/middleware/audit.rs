use sqlx::PgPool;
use uuid::Uuid;

/// Write a `system_logs` row. Called explicitly by handlers after mutations;
/// a failed write is logged and never fails the request.
pub async fn log_event(
    pool: &PgPool,
    user_id: Option<Uuid>,
    action: &str,
    details: Option<serde_json::Value>,
    ip: Option<&str>,
) {
    if let Err(e) = crate::db::system_logs::insert(pool, user_id, action, details, ip).await {
        tracing::error!("Failed to write system log '{action}': {e}");
    }
}
