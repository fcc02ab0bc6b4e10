use sqlx::PgPool;
use uuid::Uuid;

use crate::models::AdminRecord;

pub async fn create(
    pool: &PgPool,
    matricula: &str,
    email: &str,
    cpf: &str,
    full_name: &str,
) -> Result<AdminRecord, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>(
        "INSERT INTO admins (matricula, email, cpf, full_name)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(matricula)
    .bind(email)
    .bind(cpf)
    .bind(full_name)
    .fetch_one(pool)
    .await
}

pub async fn find_by_matricula(
    pool: &PgPool,
    matricula: &str,
) -> Result<Option<AdminRecord>, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>("SELECT * FROM admins WHERE matricula = $1")
        .bind(matricula)
        .fetch_optional(pool)
        .await
}

pub async fn matricula_taken(pool: &PgPool, matricula: &str) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM admins WHERE matricula = $1)")
        .bind(matricula)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn list(pool: &PgPool) -> Result<Vec<AdminRecord>, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>("SELECT * FROM admins ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn set_active(
    pool: &PgPool,
    id: Uuid,
    is_active: bool,
) -> Result<AdminRecord, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>(
        "UPDATE admins SET is_active = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(is_active)
    .fetch_one(pool)
    .await
}

pub async fn link_user<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admins SET user_id = $2 WHERE id = $1 AND user_id IS DISTINCT FROM $2")
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}
