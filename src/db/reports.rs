//! Aggregate counts backing the dashboards.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct Overview {
    pub total_clients: i64,
    pub active_clients: i64,
    pub pending_requests: i64,
    pub connected_instances: i64,
    pub total_instances: i64,
    pub open_tickets: i64,
    pub messages_today: i64,
    pub ai_messages_today: i64,
}

#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct ClientSummary {
    pub total_contacts: i64,
    pub unread_messages: i64,
    pub total_messages: i64,
    pub ai_messages: i64,
    pub open_tickets: i64,
    pub unread_announcements: i64,
}

pub async fn overview(pool: &PgPool) -> Result<Overview, sqlx::Error> {
    sqlx::query_as::<_, Overview>(
        "SELECT
            (SELECT COUNT(*) FROM clients) AS total_clients,
            (SELECT COUNT(*) FROM clients WHERE is_active AND status = 'active') AS active_clients,
            (SELECT COUNT(*) FROM account_requests WHERE status = 'pending') AS pending_requests,
            (SELECT COUNT(*) FROM whatsapp_instances WHERE status = 'connected') AS connected_instances,
            (SELECT COUNT(*) FROM whatsapp_instances) AS total_instances,
            (SELECT COUNT(*) FROM tickets WHERE status IN ('open', 'in_progress')) AS open_tickets,
            (SELECT COUNT(*) FROM whatsapp_messages WHERE \"timestamp\" >= date_trunc('day', now())) AS messages_today,
            (SELECT COUNT(*) FROM whatsapp_messages
                WHERE is_ai_response AND \"timestamp\" >= date_trunc('day', now())) AS ai_messages_today",
    )
    .fetch_one(pool)
    .await
}

pub async fn client_summary(
    pool: &PgPool,
    user_id: Uuid,
    plan: Option<&str>,
) -> Result<ClientSummary, sqlx::Error> {
    sqlx::query_as::<_, ClientSummary>(
        "SELECT
            (SELECT COUNT(*) FROM whatsapp_contacts c
                JOIN whatsapp_instances i ON i.id = c.instance_id
                WHERE i.user_id = $1) AS total_contacts,
            (SELECT COALESCE(SUM(c.unread_count), 0)::bigint FROM whatsapp_contacts c
                JOIN whatsapp_instances i ON i.id = c.instance_id
                WHERE i.user_id = $1) AS unread_messages,
            (SELECT COUNT(*) FROM whatsapp_messages m
                JOIN whatsapp_instances i ON i.id = m.instance_id
                WHERE i.user_id = $1) AS total_messages,
            (SELECT COUNT(*) FROM whatsapp_messages m
                JOIN whatsapp_instances i ON i.id = m.instance_id
                WHERE i.user_id = $1 AND m.is_ai_response) AS ai_messages,
            (SELECT COUNT(*) FROM tickets
                WHERE user_id = $1 AND status IN ('open', 'in_progress')) AS open_tickets,
            (SELECT COUNT(*) FROM announcements a
                WHERE a.sent_at IS NOT NULL
                  AND (a.target_all OR $1 = ANY(a.target_users)
                       OR ($2::text IS NOT NULL AND $2 = ANY(a.target_plans)))
                  AND NOT EXISTS (SELECT 1 FROM announcement_reads r
                                  WHERE r.announcement_id = a.id AND r.user_id = $1))
                AS unread_announcements",
    )
    .bind(user_id)
    .bind(plan)
    .fetch_one(pool)
    .await
}
