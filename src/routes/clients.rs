use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::clients::ClientUpdate;
use crate::error::AppError;
use crate::middleware::audit;
use crate::middleware::client_ip::ClientIp;
use crate::models::{Client, ClientStatus};
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateClient {
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

/// Fields a client may change on its own profile.
#[derive(Deserialize)]
pub struct UpdateProfile {
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub segmento: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

fn optional_phone(phone: Option<String>) -> Result<Option<String>, AppError> {
    validation::blank_to_none(phone)
        .map(|p| validation::normalize_phone(&p))
        .transpose()
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Client>>, AppError> {
    auth.require_admin()?;

    let status = validation::blank_to_none(query.status)
        .map(|s| s.parse::<ClientStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;
    let search = validation::blank_to_none(query.search);

    Ok(Json(
        db::clients::list(&state.pool, status, search.as_deref()).await?,
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    auth.require_admin()?;
    let client = db::clients::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;
    Ok(Json(client))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateClient>,
) -> Result<Json<Client>, AppError> {
    auth.require_admin()?;

    if req.trial_days.is_some_and(|d| d < 0) {
        return Err(AppError::BadRequest("trial_days must not be negative".to_string()));
    }

    let changes = ClientUpdate {
        full_name: validation::blank_to_none(req.full_name),
        phone: optional_phone(req.phone)?,
        company_name: validation::blank_to_none(req.company_name),
        segmento: validation::blank_to_none(req.segmento),
        birth_date: req.birth_date,
        plan: validation::blank_to_none(req.plan),
        status: req.status,
        is_active: req.is_active,
        trial_days: req.trial_days,
        expiration_date: req.expiration_date,
        observations: req.observations,
    };

    let client = db::clients::update(&state.pool, id, &changes)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Client not found".to_string()),
            _ => AppError::Database(e),
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Cliente {} atualizado", client.full_name),
        Some(json!({ "client_id": client.id, "matricula": client.matricula })),
        Some(&ip.to_string()),
    )
    .await;

    Ok(Json(client))
}

/// Soft delete: the client keeps its history but can no longer sign in.
pub async fn deactivate(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    auth.require_admin()?;

    let client = db::clients::deactivate(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    if let Some(user_id) = client.user_id {
        db::tokens::delete_all_for_user(&state.pool, db::tokens::TokenKind::Refresh, user_id)
            .await?;
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Cliente {} desativado", client.full_name),
        Some(json!({ "client_id": client.id, "matricula": client.matricula })),
        Some(&ip.to_string()),
    )
    .await;

    Ok(Json(client))
}

async fn own_client(state: &SharedState, auth: &AuthUser) -> Result<Client, AppError> {
    db::clients::find_by_user_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

pub async fn get_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(own_client(&state, &auth).await?))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfile>,
) -> Result<Json<Client>, AppError> {
    let client = own_client(&state, &auth).await?;

    let changes = ClientUpdate {
        phone: optional_phone(req.phone)?,
        company_name: validation::blank_to_none(req.company_name),
        segmento: validation::blank_to_none(req.segmento),
        birth_date: req.birth_date,
        ..ClientUpdate::default()
    };

    Ok(Json(db::clients::update(&state.pool, client.id, &changes).await?))
}
