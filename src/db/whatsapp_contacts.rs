use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WhatsappContact;

/// Insert the contact on first sight, otherwise refresh its name.
pub async fn upsert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    instance_id: Uuid,
    phone_number: &str,
    name: Option<&str>,
) -> Result<WhatsappContact, sqlx::Error> {
    sqlx::query_as::<_, WhatsappContact>(
        "INSERT INTO whatsapp_contacts (instance_id, phone_number, name)
         VALUES ($1, $2, $3)
         ON CONFLICT (instance_id, phone_number) DO UPDATE
            SET name = COALESCE(EXCLUDED.name, whatsapp_contacts.name),
                updated_at = now()
         RETURNING *",
    )
    .bind(instance_id)
    .bind(phone_number)
    .bind(name)
    .fetch_one(executor)
    .await
}

pub async fn find_in_instance(
    pool: &PgPool,
    instance_id: Uuid,
    id: Uuid,
) -> Result<Option<WhatsappContact>, sqlx::Error> {
    sqlx::query_as::<_, WhatsappContact>(
        "SELECT * FROM whatsapp_contacts WHERE id = $1 AND instance_id = $2",
    )
    .bind(id)
    .bind(instance_id)
    .fetch_optional(pool)
    .await
}

/// Most recently active conversations first.
pub async fn list_for_instance(
    pool: &PgPool,
    instance_id: Uuid,
) -> Result<Vec<WhatsappContact>, sqlx::Error> {
    sqlx::query_as::<_, WhatsappContact>(
        "SELECT * FROM whatsapp_contacts WHERE instance_id = $1 ORDER BY updated_at DESC",
    )
    .bind(instance_id)
    .fetch_all(pool)
    .await
}

pub async fn bump_unread<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE whatsapp_contacts
         SET unread_count = unread_count + 1, last_seen_at = now(), updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn touch<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE whatsapp_contacts SET updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE whatsapp_contacts SET unread_count = 0 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
