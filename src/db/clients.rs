use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AccountRequest, Client, ClientStatus};

/// Admin-editable fields. `None` leaves the column unchanged.
#[derive(Debug, Default, Clone)]
pub struct ClientUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub segmento: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub plan: Option<String>,
    pub status: Option<ClientStatus>,
    pub is_active: Option<bool>,
    pub trial_days: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
    pub observations: Option<String>,
}

/// Promote an approved request into a client carrying the same matricula.
pub async fn create_from_request<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    req: &AccountRequest,
) -> Result<Client, sqlx::Error> {
    sqlx::query_as::<_, Client>(
        "INSERT INTO clients
            (matricula, email, cpf, full_name, phone, company_name, segmento, birth_date,
             status, is_active, start_date)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', true, CURRENT_DATE)
         RETURNING *",
    )
    .bind(&req.matricula)
    .bind(&req.email)
    .bind(req.cpf.as_deref().unwrap_or_default())
    .bind(&req.full_name)
    .bind(&req.phone)
    .bind(&req.company_name)
    .bind(&req.segmento)
    .bind(req.birth_date)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Client>, sqlx::Error> {
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_matricula(
    pool: &PgPool,
    matricula: &str,
) -> Result<Option<Client>, sqlx::Error> {
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE matricula = $1")
        .bind(matricula)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_user_id(pool: &PgPool, user_id: Uuid) -> Result<Option<Client>, sqlx::Error> {
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    status: Option<ClientStatus>,
    search: Option<&str>,
) -> Result<Vec<Client>, sqlx::Error> {
    sqlx::query_as::<_, Client>(
        "SELECT * FROM clients
         WHERE ($1::text IS NULL OR status = $1)
           AND ($2::text IS NULL
                OR full_name ILIKE '%' || $2 || '%'
                OR email ILIKE '%' || $2 || '%'
                OR company_name ILIKE '%' || $2 || '%'
                OR matricula LIKE '%' || $2 || '%')
         ORDER BY created_at DESC",
    )
    .bind(status.map(|s| s.as_str()))
    .bind(search)
    .fetch_all(pool)
    .await
}

pub async fn update(pool: &PgPool, id: Uuid, changes: &ClientUpdate) -> Result<Client, sqlx::Error> {
    sqlx::query_as::<_, Client>(
        "UPDATE clients SET
            full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone),
            company_name = COALESCE($4, company_name),
            segmento = COALESCE($5, segmento),
            birth_date = COALESCE($6, birth_date),
            plan = COALESCE($7, plan),
            status = COALESCE($8, status),
            is_active = COALESCE($9, is_active),
            trial_days = COALESCE($10, trial_days),
            expiration_date = COALESCE($11, expiration_date),
            observations = COALESCE($12, observations),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.full_name)
    .bind(&changes.phone)
    .bind(&changes.company_name)
    .bind(&changes.segmento)
    .bind(changes.birth_date)
    .bind(&changes.plan)
    .bind(changes.status.map(|s| s.as_str()))
    .bind(changes.is_active)
    .bind(changes.trial_days)
    .bind(changes.expiration_date)
    .bind(&changes.observations)
    .fetch_one(pool)
    .await
}

pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<Option<Client>, sqlx::Error> {
    sqlx::query_as::<_, Client>(
        "UPDATE clients SET is_active = false, status = 'inactive', updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn link_user<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE clients SET user_id = $2, updated_at = now()
         WHERE id = $1 AND user_id IS DISTINCT FROM $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn touch_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE clients SET last_login_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
