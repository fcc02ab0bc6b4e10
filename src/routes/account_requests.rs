use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::account_requests::NewAccountRequest;
use crate::error::{AppError, is_unique_violation};
use crate::matricula;
use crate::middleware::audit;
use crate::middleware::client_ip::ClientIp;
use crate::models::{AccountRequest, Client, RequestStatus};
use crate::state::SharedState;
use crate::validation;

const MATRICULA_ATTEMPTS: usize = 5;

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub company_name: Option<String>,
    pub segmento: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct CreatedRequest {
    pub id: Uuid,
    pub matricula: String,
    pub status: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct RequestList {
    pub requests: Vec<AccountRequest>,
    pub pending_count: i64,
}

#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct ApprovedRequest {
    pub request: AccountRequest,
    pub client: Client,
}

fn duplicate_message(field: &str) -> String {
    match field {
        "email" => "Este e-mail já possui uma solicitação ou conta".to_string(),
        _ => "Este CPF já possui uma solicitação ou conta".to_string(),
    }
}

/// Public signup. Stores a pending request under a fresh 6-digit matricula.
pub async fn create(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreatedRequest>), AppError> {
    validation::require_non_empty(&req.full_name, "full_name")?;
    let new = NewAccountRequest {
        full_name: req.full_name.trim().to_string(),
        email: validation::normalize_email(&req.email)?,
        cpf: validation::normalize_cpf(&req.cpf)?,
        phone: validation::normalize_phone(&req.phone)?,
        company_name: validation::blank_to_none(req.company_name),
        segmento: validation::blank_to_none(req.segmento),
        birth_date: req.birth_date,
        message: validation::blank_to_none(req.message),
    };

    if let Some(field) =
        db::account_requests::find_duplicate_field(&state.pool, &new.email, &new.cpf).await?
    {
        return Err(AppError::Conflict(duplicate_message(field)));
    }

    let mut created = None;
    for _ in 0..MATRICULA_ATTEMPTS {
        let candidate = matricula::generate(6);
        if db::account_requests::matricula_taken(&state.pool, &candidate).await? {
            continue;
        }
        match db::account_requests::create(&state.pool, &new, &candidate).await {
            Ok(request) => {
                created = Some(request);
                break;
            }
            Err(sqlx::Error::Database(ref db_err))
                if db_err.is_unique_violation()
                    && db_err.constraint().is_some_and(|c| c.contains("matricula")) =>
            {
                continue;
            }
            Err(e) if is_unique_violation(&e) => {
                // Concurrent signup with the same identity slipped past the pre-check.
                return Err(AppError::Conflict(
                    "Já existe uma solicitação com estes dados".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }
    let request = created.ok_or_else(|| {
        AppError::Internal("Could not allocate a unique matricula".to_string())
    })?;

    tracing::info!(request_id = %request.id, matricula = %request.matricula, "Account request received");
    audit::log_event(
        &state.pool,
        None,
        &format!("Nova solicitação de {}", request.full_name),
        Some(json!({ "request_id": request.id, "matricula": request.matricula })),
        Some(&ip.to_string()),
    )
    .await;

    if let Some(mailer) = state.system_mailer.clone() {
        let (email, name, matricula) = (
            request.email.clone(),
            request.full_name.clone(),
            request.matricula.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = mailer.send_request_received(&email, &name, &matricula).await {
                tracing::error!("Failed to send request receipt: {e}");
            }
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(CreatedRequest {
            id: request.id,
            matricula: request.matricula,
            status: request.status,
        }),
    ))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RequestList>, AppError> {
    auth.require_admin()?;

    let status = validation::blank_to_none(query.status)
        .map(|s| s.parse::<RequestStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;
    let search = validation::blank_to_none(query.search);

    let requests = db::account_requests::list(&state.pool, status, search.as_deref()).await?;
    let pending_count =
        db::account_requests::count_by_status(&state.pool, RequestStatus::Pending).await?;

    Ok(Json(RequestList {
        requests,
        pending_count,
    }))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountRequest>, AppError> {
    auth.require_admin()?;
    let request = db::account_requests::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;
    Ok(Json(request))
}

/// Pending request not found or already reviewed.
async fn not_pending(state: &SharedState, id: Uuid) -> AppError {
    match db::account_requests::find_by_id(&state.pool, id).await {
        Ok(Some(_)) => AppError::Conflict("Request has already been reviewed".to_string()),
        Ok(None) => AppError::NotFound("Request not found".to_string()),
        Err(e) => e.into(),
    }
}

pub async fn approve(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<Uuid>,
) -> Result<Json<ApprovedRequest>, AppError> {
    auth.require_admin()?;

    let mut tx = state.pool.begin().await?;
    let Some(request) = db::account_requests::review(
        &mut *tx,
        id,
        RequestStatus::Approved,
        auth.user_id,
        None,
    )
    .await?
    else {
        drop(tx);
        return Err(not_pending(&state, id).await);
    };

    let client = db::clients::create_from_request(&mut *tx, &request)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("A client with this email or CPF already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;
    tx.commit().await?;

    tracing::info!(request_id = %request.id, client_id = %client.id, "Account request approved");
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Cliente {} aprovado", request.full_name),
        Some(json!({ "request_id": request.id, "matricula": request.matricula })),
        Some(&ip.to_string()),
    )
    .await;

    if let Some(mailer) = state.system_mailer.clone() {
        let login_url = format!("{}/login", state.config.base_url);
        let (email, name, matricula) = (
            request.email.clone(),
            request.full_name.clone(),
            request.matricula.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_request_approved(&email, &name, &matricula, &login_url)
                .await
            {
                tracing::error!("Failed to send approval email: {e}");
            }
        });
    }

    Ok(Json(ApprovedRequest { request, client }))
}

pub async fn reject(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<AccountRequest>, AppError> {
    auth.require_admin()?;

    let reason = body.and_then(|Json(b)| validation::blank_to_none(b.reason));

    let Some(request) = db::account_requests::review(
        &state.pool,
        id,
        RequestStatus::Rejected,
        auth.user_id,
        reason.as_deref(),
    )
    .await?
    else {
        return Err(not_pending(&state, id).await);
    };

    tracing::info!(request_id = %request.id, "Account request rejected");
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Solicitação de {} reprovada", request.full_name),
        Some(json!({
            "request_id": request.id,
            "matricula": request.matricula,
            "reason": request.rejection_reason,
        })),
        Some(&ip.to_string()),
    )
    .await;

    if let Some(mailer) = state.system_mailer.clone() {
        let (email, name, reason) = (
            request.email.clone(),
            request.full_name.clone(),
            request.rejection_reason.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_request_rejected(&email, &name, reason.as_deref())
                .await
            {
                tracing::error!("Failed to send rejection email: {e}");
            }
        });
    }

    Ok(Json(request))
}
