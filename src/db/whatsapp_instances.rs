use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{InstanceStatus, WhatsappInstance};

/// Dashboard-editable instance fields. `None` leaves the column unchanged.
#[derive(Debug, Default, Clone)]
pub struct InstanceUpdate {
    pub instance_name: Option<String>,
    pub phone_number: Option<String>,
    pub status: Option<InstanceStatus>,
    pub is_ai_active: Option<bool>,
    pub qr_code: Option<String>,
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    instance_name: &str,
    phone_number: Option<&str>,
) -> Result<WhatsappInstance, sqlx::Error> {
    sqlx::query_as::<_, WhatsappInstance>(
        "INSERT INTO whatsapp_instances (user_id, instance_name, phone_number)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(instance_name)
    .bind(phone_number)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<WhatsappInstance>, sqlx::Error> {
    sqlx::query_as::<_, WhatsappInstance>("SELECT * FROM whatsapp_instances WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    user_id: Option<Uuid>,
    status: Option<InstanceStatus>,
) -> Result<Vec<WhatsappInstance>, sqlx::Error> {
    sqlx::query_as::<_, WhatsappInstance>(
        "SELECT * FROM whatsapp_instances
         WHERE ($1::uuid IS NULL OR user_id = $1)
           AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &InstanceUpdate,
) -> Result<WhatsappInstance, sqlx::Error> {
    sqlx::query_as::<_, WhatsappInstance>(
        "UPDATE whatsapp_instances SET
            instance_name = COALESCE($2, instance_name),
            phone_number = COALESCE($3, phone_number),
            status = COALESCE($4, status),
            is_ai_active = COALESCE($5, is_ai_active),
            qr_code = COALESCE($6, qr_code),
            last_connected_at = CASE WHEN $4 = 'connected' THEN now() ELSE last_connected_at END,
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.instance_name)
    .bind(&changes.phone_number)
    .bind(changes.status.map(|s| s.as_str()))
    .bind(changes.is_ai_active)
    .bind(&changes.qr_code)
    .fetch_one(pool)
    .await
}

pub async fn set_session(
    pool: &PgPool,
    id: Uuid,
    session_data_enc: Option<&[u8]>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE whatsapp_instances SET session_data_enc = $2, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(session_data_enc)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM whatsapp_instances WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
