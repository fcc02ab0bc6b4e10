//! Hashed one-time tokens: refresh tokens and password-reset tokens share one
//! table layout and differ only in where they live.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::StoredToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Refresh,
    PasswordReset,
}

impl TokenKind {
    fn table(self) -> &'static str {
        match self {
            TokenKind::Refresh => "refresh_tokens",
            TokenKind::PasswordReset => "password_reset_tokens",
        }
    }
}

pub async fn create(
    pool: &PgPool,
    kind: TokenKind,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO {} (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        kind.table()
    ))
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Look up a token regardless of state; the caller decides about reuse and expiry.
pub async fn find_by_hash(
    pool: &PgPool,
    kind: TokenKind,
    token_hash: &str,
) -> Result<Option<StoredToken>, sqlx::Error> {
    sqlx::query_as::<_, StoredToken>(&format!(
        "SELECT * FROM {} WHERE token_hash = $1",
        kind.table()
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

/// Unused, unexpired token only.
pub async fn find_valid_by_hash(
    pool: &PgPool,
    kind: TokenKind,
    token_hash: &str,
) -> Result<Option<StoredToken>, sqlx::Error> {
    sqlx::query_as::<_, StoredToken>(&format!(
        "SELECT * FROM {} WHERE token_hash = $1 AND used = false AND expires_at > now()",
        kind.table()
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn mark_used(pool: &PgPool, kind: TokenKind, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(&format!("UPDATE {} SET used = true WHERE id = $1", kind.table()))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_all_for_user(
    pool: &PgPool,
    kind: TokenKind,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!("DELETE FROM {} WHERE user_id = $1", kind.table()))
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_by_hash(
    pool: &PgPool,
    kind: TokenKind,
    token_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!("DELETE FROM {} WHERE token_hash = $1", kind.table()))
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop expired tokens of both kinds. Returns the number of rows removed.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let mut removed = 0;
    for kind in [TokenKind::Refresh, TokenKind::PasswordReset] {
        removed += sqlx::query(&format!(
            "DELETE FROM {} WHERE expires_at < now() - interval '1 day'",
            kind.table()
        ))
        .execute(pool)
        .await?
        .rows_affected();
    }
    Ok(removed)
}
