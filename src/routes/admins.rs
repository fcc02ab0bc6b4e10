use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::{AppError, is_unique_violation};
use crate::matricula;
use crate::middleware::audit;
use crate::middleware::client_ip::ClientIp;
use crate::models::{AdminRecord, Role, UserRole};
use crate::state::SharedState;
use crate::validation;

const MATRICULA_ATTEMPTS: usize = 5;

#[derive(Deserialize)]
pub struct CreateAdmin {
    pub full_name: String,
    pub email: String,
    pub cpf: String,
}

#[derive(Deserialize)]
pub struct UpdateAdmin {
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct SetRole {
    pub role: Role,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<AdminRecord>>, AppError> {
    auth.require_super_admin()?;
    Ok(Json(db::admins::list(&state.pool).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<CreateAdmin>,
) -> Result<(StatusCode, Json<AdminRecord>), AppError> {
    auth.require_super_admin()?;

    validation::require_non_empty(&req.full_name, "full_name")?;
    let email = validation::normalize_email(&req.email)?;
    let cpf = validation::normalize_cpf(&req.cpf)?;

    let mut created = None;
    for _ in 0..MATRICULA_ATTEMPTS {
        let candidate = matricula::generate(7);
        if db::admins::matricula_taken(&state.pool, &candidate).await? {
            continue;
        }
        match db::admins::create(&state.pool, &candidate, &email, &cpf, req.full_name.trim()).await
        {
            Ok(admin) => {
                created = Some(admin);
                break;
            }
            Err(sqlx::Error::Database(ref db_err))
                if db_err.is_unique_violation()
                    && db_err.constraint().is_some_and(|c| c.contains("matricula")) =>
            {
                continue;
            }
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "An admin with this email already exists".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }
    let admin = created.ok_or_else(|| {
        AppError::Internal("Could not allocate a unique matricula".to_string())
    })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Administrador {} criado", admin.full_name),
        Some(json!({ "admin_id": admin.id, "matricula": admin.matricula })),
        Some(&ip.to_string()),
    )
    .await;

    Ok((StatusCode::CREATED, Json(admin)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAdmin>,
) -> Result<Json<AdminRecord>, AppError> {
    auth.require_super_admin()?;

    let admin = db::admins::set_active(&state.pool, id, req.is_active)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Admin not found".to_string()),
            _ => AppError::Database(e),
        })?;

    if !admin.is_active {
        if let Some(user_id) = admin.user_id {
            db::tokens::delete_all_for_user(&state.pool, db::tokens::TokenKind::Refresh, user_id)
                .await?;
        }
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!(
            "Administrador {} {}",
            admin.full_name,
            if admin.is_active { "ativado" } else { "desativado" }
        ),
        Some(json!({ "admin_id": admin.id })),
        Some(&ip.to_string()),
    )
    .await;

    Ok(Json(admin))
}

pub async fn get_roles(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<UserRole>>, AppError> {
    auth.require_super_admin()?;
    Ok(Json(db::user_roles::list_for_user(&state.pool, user_id).await?))
}

pub async fn set_role(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetRole>,
) -> Result<Json<Vec<UserRole>>, AppError> {
    auth.require_super_admin()?;

    if user_id == auth.user_id && req.role != Role::SuperAdmin {
        return Err(AppError::BadRequest("You cannot demote yourself".to_string()));
    }

    db::users::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    db::user_roles::replace(&state.pool, user_id, req.role).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Papel alterado para {}", req.role),
        Some(json!({ "user_id": user_id, "role": req.role })),
        Some(&ip.to_string()),
    )
    .await;

    Ok(Json(db::user_roles::list_for_user(&state.pool, user_id).await?))
}
