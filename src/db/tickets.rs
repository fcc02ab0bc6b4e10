use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Ticket, TicketMessage, TicketPriority, TicketStatus};

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    subject: &str,
    category: Option<&str>,
    priority: TicketPriority,
) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "INSERT INTO tickets (user_id, subject, category, priority)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(subject)
    .bind(category)
    .bind(priority.as_str())
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Admins pass `owner = None` to see every ticket.
pub async fn list(
    pool: &PgPool,
    owner: Option<Uuid>,
    status: Option<TicketStatus>,
) -> Result<Vec<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets
         WHERE ($1::uuid IS NULL OR user_id = $1)
           AND ($2::text IS NULL OR status = $2)
         ORDER BY updated_at DESC",
    )
    .bind(owner)
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await
}

pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    status: Option<TicketStatus>,
    priority: Option<TicketPriority>,
    assigned_admin_id: Option<Uuid>,
) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "UPDATE tickets SET
            status = COALESCE($2, status),
            priority = COALESCE($3, priority),
            assigned_admin_id = COALESCE($4, assigned_admin_id),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(status.map(|s| s.as_str()))
    .bind(priority.map(|p| p.as_str()))
    .bind(assigned_admin_id)
    .fetch_one(executor)
    .await
}

pub async fn touch<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tickets SET updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn add_message<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ticket_id: Uuid,
    sender_id: Uuid,
    content: &str,
    attachment_url: Option<&str>,
    is_system_message: bool,
) -> Result<TicketMessage, sqlx::Error> {
    sqlx::query_as::<_, TicketMessage>(
        "INSERT INTO ticket_messages (ticket_id, sender_id, content, attachment_url, is_system_message)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(ticket_id)
    .bind(sender_id)
    .bind(content)
    .bind(attachment_url)
    .bind(is_system_message)
    .fetch_one(executor)
    .await
}

pub async fn list_messages(pool: &PgPool, ticket_id: Uuid) -> Result<Vec<TicketMessage>, sqlx::Error> {
    sqlx::query_as::<_, TicketMessage>(
        "SELECT * FROM ticket_messages WHERE ticket_id = $1 ORDER BY created_at ASC",
    )
    .bind(ticket_id)
    .fetch_all(pool)
    .await
}
