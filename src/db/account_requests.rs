use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AccountRequest, RequestStatus};

/// Validated signup data, ready to insert.
#[derive(Debug, Clone)]
pub struct NewAccountRequest {
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub company_name: Option<String>,
    pub segmento: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub message: Option<String>,
}

pub async fn create(
    pool: &PgPool,
    req: &NewAccountRequest,
    matricula: &str,
) -> Result<AccountRequest, sqlx::Error> {
    sqlx::query_as::<_, AccountRequest>(
        "INSERT INTO account_requests
            (full_name, email, cpf, phone, company_name, segmento, birth_date, message, matricula)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(&req.full_name)
    .bind(&req.email)
    .bind(&req.cpf)
    .bind(&req.phone)
    .bind(&req.company_name)
    .bind(&req.segmento)
    .bind(req.birth_date)
    .bind(&req.message)
    .bind(matricula)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AccountRequest>, sqlx::Error> {
    sqlx::query_as::<_, AccountRequest>("SELECT * FROM account_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_matricula(
    pool: &PgPool,
    matricula: &str,
) -> Result<Option<AccountRequest>, sqlx::Error> {
    sqlx::query_as::<_, AccountRequest>("SELECT * FROM account_requests WHERE matricula = $1")
        .bind(matricula)
        .fetch_optional(pool)
        .await
}

pub async fn matricula_taken(pool: &PgPool, matricula: &str) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM account_requests WHERE matricula = $1)
             OR EXISTS (SELECT 1 FROM clients WHERE matricula = $1)",
    )
    .bind(matricula)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Which identity field of a signup collides with an open request or an existing client.
pub async fn find_duplicate_field(
    pool: &PgPool,
    email: &str,
    cpf: &str,
) -> Result<Option<&'static str>, sqlx::Error> {
    let row: (bool, bool) = sqlx::query_as(
        "SELECT
            EXISTS (SELECT 1 FROM account_requests WHERE lower(email) = lower($1) AND status <> 'rejected')
                OR EXISTS (SELECT 1 FROM clients WHERE lower(email) = lower($1)),
            EXISTS (SELECT 1 FROM account_requests WHERE cpf = $2 AND status <> 'rejected')
                OR EXISTS (SELECT 1 FROM clients WHERE cpf = $2)",
    )
    .bind(email)
    .bind(cpf)
    .fetch_one(pool)
    .await?;

    Ok(match row {
        (true, _) => Some("email"),
        (_, true) => Some("cpf"),
        _ => None,
    })
}

/// Newest first. `search` matches name/email case-insensitively and matricula/CPF by substring.
pub async fn list(
    pool: &PgPool,
    status: Option<RequestStatus>,
    search: Option<&str>,
) -> Result<Vec<AccountRequest>, sqlx::Error> {
    sqlx::query_as::<_, AccountRequest>(
        "SELECT * FROM account_requests
         WHERE ($1::text IS NULL OR status = $1)
           AND ($2::text IS NULL
                OR full_name ILIKE '%' || $2 || '%'
                OR email ILIKE '%' || $2 || '%'
                OR matricula LIKE '%' || $2 || '%'
                OR cpf LIKE '%' || $2 || '%')
         ORDER BY created_at DESC",
    )
    .bind(status.map(|s| s.as_str()))
    .bind(search)
    .fetch_all(pool)
    .await
}

pub async fn count_by_status(pool: &PgPool, status: RequestStatus) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM account_requests WHERE status = $1")
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Move a pending request to `approved` or `rejected`. `None` when the request
/// does not exist or was already reviewed.
pub async fn review<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    status: RequestStatus,
    reviewer: Uuid,
    rejection_reason: Option<&str>,
) -> Result<Option<AccountRequest>, sqlx::Error> {
    sqlx::query_as::<_, AccountRequest>(
        "UPDATE account_requests
         SET status = $2, reviewed_by = $3, reviewed_at = now(), rejection_reason = $4
         WHERE id = $1 AND status = 'pending'
         RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(reviewer)
    .bind(rejection_reason)
    .fetch_optional(executor)
    .await
}
