use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::announcements::NewAnnouncement;
use crate::error::AppError;
use crate::middleware::audit;
use crate::middleware::client_ip::ClientIp;
use crate::models::{Announcement, AnnouncementPriority, Role, UserAnnouncement};
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
pub struct CreateAnnouncement {
    pub title: String,
    pub content: String,
    pub priority: Option<AnnouncementPriority>,
    #[serde(default = "default_true")]
    pub target_all: bool,
    #[serde(default)]
    pub target_plans: Vec<String>,
    #[serde(default)]
    pub target_users: Vec<Uuid>,
    pub attachment_url: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<CreateAnnouncement>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    auth.require_admin()?;
    validation::require_non_empty(&req.title, "title")?;
    validation::require_non_empty(&req.content, "content")?;

    if !req.target_all && req.target_plans.is_empty() && req.target_users.is_empty() {
        return Err(AppError::BadRequest(
            "Announcement needs at least one target".to_string(),
        ));
    }

    let new = NewAnnouncement {
        title: req.title.trim().to_string(),
        content: req.content,
        priority: req.priority.unwrap_or(AnnouncementPriority::Normal),
        target_all: req.target_all,
        target_plans: req.target_plans,
        target_users: req.target_users,
        attachment_url: validation::blank_to_none(req.attachment_url),
        scheduled_at: req.scheduled_at,
    };

    let announcement = db::announcements::create(&state.pool, auth.user_id, &new).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Comunicado '{}' criado", announcement.title),
        Some(json!({
            "announcement_id": announcement.id,
            "scheduled_at": announcement.scheduled_at,
        })),
        Some(&ip.to_string()),
    )
    .await;

    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn list_all(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    auth.require_admin()?;
    Ok(Json(db::announcements::list_all(&state.pool).await?))
}

/// Announcements addressed to the caller, newest first, with their read flag.
pub async fn list_mine(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<UserAnnouncement>>, AppError> {
    let plan = if auth.role == Role::Client {
        db::clients::find_by_user_id(&state.pool, auth.user_id)
            .await?
            .map(|c| c.plan)
    } else {
        None
    };

    Ok(Json(
        db::announcements::list_for_user(&state.pool, auth.user_id, plan.as_deref()).await?,
    ))
}

pub async fn mark_read(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    db::announcements::mark_read(&state.pool, id, auth.user_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound("Announcement not found".to_string())
            }
            _ => AppError::Database(e),
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;
    if !db::announcements::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Announcement not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "Comunicado removido",
        Some(json!({ "announcement_id": id })),
        Some(&ip.to_string()),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
