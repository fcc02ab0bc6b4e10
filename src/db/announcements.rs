use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Announcement, AnnouncementPriority, UserAnnouncement};

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub priority: AnnouncementPriority,
    pub target_all: bool,
    pub target_plans: Vec<String>,
    pub target_users: Vec<Uuid>,
    pub attachment_url: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Unscheduled announcements, or ones scheduled in the past, are sent immediately.
pub async fn create(
    pool: &PgPool,
    created_by: Uuid,
    new: &NewAnnouncement,
) -> Result<Announcement, sqlx::Error> {
    sqlx::query_as::<_, Announcement>(
        "INSERT INTO announcements
            (title, content, priority, target_all, target_plans, target_users, attachment_url,
             scheduled_at, sent_at, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                 CASE WHEN $8::timestamptz IS NULL OR $8 <= now() THEN now() END, $9)
         RETURNING *",
    )
    .bind(&new.title)
    .bind(&new.content)
    .bind(new.priority.as_str())
    .bind(new.target_all)
    .bind(&new.target_plans)
    .bind(&new.target_users)
    .bind(&new.attachment_url)
    .bind(new.scheduled_at)
    .bind(created_by)
    .fetch_one(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Announcement>, sqlx::Error> {
    sqlx::query_as::<_, Announcement>("SELECT * FROM announcements ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Sent announcements that target this user directly, by plan, or everyone.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    plan: Option<&str>,
) -> Result<Vec<UserAnnouncement>, sqlx::Error> {
    sqlx::query_as::<_, UserAnnouncement>(
        "SELECT a.id, a.title, a.content, a.priority, a.attachment_url, a.sent_at,
                (r.id IS NOT NULL) AS read
         FROM announcements a
         LEFT JOIN announcement_reads r ON r.announcement_id = a.id AND r.user_id = $1
         WHERE a.sent_at IS NOT NULL
           AND (a.target_all
                OR $1 = ANY(a.target_users)
                OR ($2::text IS NOT NULL AND $2 = ANY(a.target_plans)))
         ORDER BY a.sent_at DESC",
    )
    .bind(user_id)
    .bind(plan)
    .fetch_all(pool)
    .await
}

pub async fn mark_read(pool: &PgPool, announcement_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO announcement_reads (announcement_id, user_id) VALUES ($1, $2)
         ON CONFLICT (announcement_id, user_id) DO NOTHING",
    )
    .bind(announcement_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Stamp `sent_at` on scheduled announcements whose time has come.
pub async fn publish_due(pool: &PgPool) -> Result<Vec<Announcement>, sqlx::Error> {
    sqlx::query_as::<_, Announcement>(
        "UPDATE announcements SET sent_at = now()
         WHERE sent_at IS NULL AND scheduled_at IS NOT NULL AND scheduled_at <= now()
         RETURNING *",
    )
    .fetch_all(pool)
    .await
}
