use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Role, UserRole};

pub async fn roles_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Role>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT role FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    // The CHECK constraint keeps unknown values out; skip rather than fail if one slips in.
    Ok(rows.into_iter().filter_map(|(r,)| r.parse().ok()).collect())
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<UserRole>, sqlx::Error> {
    sqlx::query_as::<_, UserRole>(
        "SELECT * FROM user_roles WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Grant a role. Granting a role the user already holds is a no-op.
pub async fn assign<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    role: Role,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_roles (user_id, role) VALUES ($1, $2)
         ON CONFLICT (user_id, role) DO NOTHING",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

/// Make `role` the user's only role.
pub async fn replace(pool: &PgPool, user_id: Uuid, role: Role) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role <> $2")
        .bind(user_id)
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?;
    assign(&mut *tx, user_id, role).await?;
    tx.commit().await
}
