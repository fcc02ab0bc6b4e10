use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Ticket, TicketMessage, TicketPriority, TicketStatus};
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
pub struct CreateTicket {
    pub subject: String,
    pub category: Option<String>,
    pub priority: Option<TicketPriority>,
    pub message: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTicket {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assigned_admin_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct NewTicketMessage {
    pub content: String,
    pub attachment_url: Option<String>,
}

#[derive(Serialize)]
pub struct TicketThread {
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
}

async fn accessible_ticket(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<Ticket, AppError> {
    db::tickets::find_by_id(&state.pool, id)
        .await?
        .filter(|t| auth.can_access(t.user_id))
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateTicket>,
) -> Result<(StatusCode, Json<TicketThread>), AppError> {
    validation::require_non_empty(&req.subject, "subject")?;
    validation::require_non_empty(&req.message, "message")?;

    let category = validation::blank_to_none(req.category);
    let mut tx = state.pool.begin().await?;
    let ticket = db::tickets::create(
        &mut *tx,
        auth.user_id,
        req.subject.trim(),
        category.as_deref(),
        req.priority.unwrap_or(TicketPriority::Normal),
    )
    .await?;
    let first = db::tickets::add_message(
        &mut *tx,
        ticket.id,
        auth.user_id,
        req.message.trim(),
        None,
        false,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(ticket_id = %ticket.id, user_id = %auth.user_id, "Support ticket opened");
    Ok((
        StatusCode::CREATED,
        Json(TicketThread {
            ticket,
            messages: vec![first],
        }),
    ))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Ticket>>, AppError> {
    let status = validation::blank_to_none(query.status)
        .map(|s| s.parse::<TicketStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;
    let owner = (!auth.is_admin()).then_some(auth.user_id);
    Ok(Json(db::tickets::list(&state.pool, owner, status).await?))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketThread>, AppError> {
    let ticket = accessible_ticket(&state, &auth, id).await?;
    let messages = db::tickets::list_messages(&state.pool, ticket.id).await?;
    Ok(Json(TicketThread { ticket, messages }))
}

pub async fn add_message(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewTicketMessage>,
) -> Result<(StatusCode, Json<TicketMessage>), AppError> {
    validation::require_non_empty(&req.content, "content")?;
    let ticket = accessible_ticket(&state, &auth, id).await?;

    if ticket.status == TicketStatus::Closed.as_str() {
        return Err(AppError::Conflict("Ticket is closed".to_string()));
    }

    let attachment = validation::blank_to_none(req.attachment_url);
    let mut tx = state.pool.begin().await?;
    let message = db::tickets::add_message(
        &mut *tx,
        ticket.id,
        auth.user_id,
        req.content.trim(),
        attachment.as_deref(),
        false,
    )
    .await?;
    db::tickets::touch(&mut *tx, ticket.id).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Admin triage. A status change is announced in the thread as a system message.
pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTicket>,
) -> Result<Json<TicketThread>, AppError> {
    auth.require_admin()?;
    let ticket = accessible_ticket(&state, &auth, id).await?;

    let status_changed = req
        .status
        .filter(|s| s.as_str() != ticket.status);

    if let Some(assignee) = req.assigned_admin_id {
        let roles = db::user_roles::roles_for_user(&state.pool, assignee).await?;
        if !roles.iter().any(|r| r.is_admin()) {
            return Err(AppError::BadRequest(
                "assigned_admin_id must reference an admin".to_string(),
            ));
        }
    }

    let mut tx = state.pool.begin().await?;
    let ticket = db::tickets::update(
        &mut *tx,
        ticket.id,
        req.status,
        req.priority,
        req.assigned_admin_id,
    )
    .await?;
    if let Some(status) = status_changed {
        db::tickets::add_message(
            &mut *tx,
            ticket.id,
            auth.user_id,
            &format!("Status alterado para: {}", status.label()),
            None,
            true,
        )
        .await?;
    }
    tx.commit().await?;

    let messages = db::tickets::list_messages(&state.pool, ticket.id).await?;
    Ok(Json(TicketThread { ticket, messages }))
}
