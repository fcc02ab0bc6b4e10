use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::crypto;
use crate::db;
use crate::db::whatsapp_instances::InstanceUpdate;
use crate::db::whatsapp_messages::NewMessage;
use crate::error::{AppError, is_unique_violation};
use crate::middleware::audit;
use crate::middleware::client_ip::ClientIp;
use crate::models::{InstanceStatus, WhatsappContact, WhatsappInstance, WhatsappMessage};
use crate::state::SharedState;
use crate::validation;

const DEFAULT_MESSAGE_LIMIT: i64 = 100;
const MAX_MESSAGE_LIMIT: i64 = 500;

#[derive(Serialize)]
pub struct InstanceView {
    #[serde(flatten)]
    pub instance: WhatsappInstance,
    pub has_session: bool,
}

impl From<WhatsappInstance> for InstanceView {
    fn from(instance: WhatsappInstance) -> Self {
        let has_session = instance.has_session();
        Self {
            instance,
            has_session,
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateInstance {
    pub instance_name: String,
    pub phone_number: Option<String>,
    /// Admins create instances on behalf of a client user.
    pub user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateInstance {
    pub instance_name: Option<String>,
    pub phone_number: Option<String>,
    pub status: Option<InstanceStatus>,
    pub is_ai_active: Option<bool>,
    pub qr_code: Option<String>,
}

#[derive(Deserialize)]
pub struct StoreSession {
    pub session_data: serde_json::Value,
}

#[derive(Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct SendMessage {
    pub content: String,
}

#[derive(Deserialize)]
pub struct InboundMessage {
    pub phone_number: String,
    pub name: Option<String>,
    pub content: Option<String>,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
}

#[derive(Serialize)]
pub struct InboundResult {
    pub contact: WhatsappContact,
    pub message: WhatsappMessage,
}

/// Instances are visible to their owner and to admins only.
async fn accessible_instance(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<WhatsappInstance, AppError> {
    db::whatsapp_instances::find_by_id(&state.pool, id)
        .await?
        .filter(|i| auth.can_access(i.user_id))
        .ok_or_else(|| AppError::NotFound("Instance not found".to_string()))
}

async fn accessible_contact(
    state: &SharedState,
    instance: &WhatsappInstance,
    contact_id: Uuid,
) -> Result<WhatsappContact, AppError> {
    db::whatsapp_contacts::find_in_instance(&state.pool, instance.id, contact_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact not found".to_string()))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InstanceView>>, AppError> {
    let status = validation::blank_to_none(query.status)
        .map(|s| s.parse::<InstanceStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;
    let owner = (!auth.is_admin()).then_some(auth.user_id);

    let instances = db::whatsapp_instances::list(&state.pool, owner, status).await?;
    Ok(Json(instances.into_iter().map(InstanceView::from).collect()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<CreateInstance>,
) -> Result<(StatusCode, Json<InstanceView>), AppError> {
    validation::require_non_empty(&req.instance_name, "instance_name")?;

    let owner = match req.user_id {
        Some(user_id) if user_id != auth.user_id => {
            auth.require_admin()?;
            db::users::find_by_id(&state.pool, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
                .id
        }
        _ => auth.user_id,
    };

    let phone = validation::blank_to_none(req.phone_number).map(|p| validation::digits_only(&p));

    let instance = db::whatsapp_instances::create(
        &state.pool,
        owner,
        req.instance_name.trim(),
        phone.as_deref(),
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("This account already has a WhatsApp instance".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Instância {} criada", instance.instance_name),
        Some(json!({ "instance_id": instance.id, "owner": owner })),
        Some(&ip.to_string()),
    )
    .await;

    Ok((StatusCode::CREATED, Json(instance.into())))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InstanceView>, AppError> {
    Ok(Json(accessible_instance(&state, &auth, id).await?.into()))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInstance>,
) -> Result<Json<InstanceView>, AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;

    let changes = InstanceUpdate {
        instance_name: validation::blank_to_none(req.instance_name),
        phone_number: validation::blank_to_none(req.phone_number)
            .map(|p| validation::digits_only(&p)),
        status: req.status,
        is_ai_active: req.is_ai_active,
        qr_code: req.qr_code,
    };

    let updated = db::whatsapp_instances::update(&state.pool, instance.id, &changes).await?;
    if let Some(status) = req.status {
        tracing::info!(instance_id = %updated.id, %status, "Instance status changed");
    }
    Ok(Json(updated.into()))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;
    db::whatsapp_instances::delete(&state.pool, instance.id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        &format!("Instância {} removida", instance.instance_name),
        Some(json!({ "instance_id": instance.id })),
        Some(&ip.to_string()),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Decrypted session blob, for the connector process that resumes the WhatsApp login.
pub async fn get_session(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;
    let sealed = instance
        .session_data_enc
        .ok_or_else(|| AppError::NotFound("No session stored".to_string()))?;

    let plaintext =
        crypto::decrypt(&sealed, &state.config.encryption_key).map_err(AppError::Internal)?;
    let session_data: serde_json::Value = serde_json::from_slice(&plaintext)
        .map_err(|e| AppError::Internal(format!("Corrupt session blob: {e}")))?;

    Ok(Json(json!({ "session_data": session_data })))
}

pub async fn store_session(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StoreSession>,
) -> Result<Json<InstanceView>, AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;

    let plaintext = serde_json::to_vec(&req.session_data)
        .map_err(|e| AppError::Internal(format!("Failed to serialize session: {e}")))?;
    let sealed = crypto::encrypt(&plaintext, &state.config.encryption_key)
        .map_err(AppError::Internal)?;

    db::whatsapp_instances::set_session(&state.pool, instance.id, Some(&sealed)).await?;
    let refreshed = accessible_instance(&state, &auth, id).await?;
    Ok(Json(refreshed.into()))
}

pub async fn clear_session(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InstanceView>, AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;
    db::whatsapp_instances::set_session(&state.pool, instance.id, None).await?;
    let refreshed = accessible_instance(&state, &auth, id).await?;
    Ok(Json(refreshed.into()))
}

pub async fn list_contacts(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<WhatsappContact>>, AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;
    Ok(Json(
        db::whatsapp_contacts::list_for_instance(&state.pool, instance.id).await?,
    ))
}

pub async fn list_messages(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<WhatsappMessage>>, AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;
    let contact = accessible_contact(&state, &instance, contact_id).await?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_MESSAGE_LIMIT)
        .clamp(1, MAX_MESSAGE_LIMIT);

    Ok(Json(
        db::whatsapp_messages::list_for_contact(&state.pool, contact.id, limit).await?,
    ))
}

/// Manual reply typed by a human operator.
pub async fn send_message(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SendMessage>,
) -> Result<(StatusCode, Json<WhatsappMessage>), AppError> {
    validation::require_non_empty(&req.content, "content")?;
    let instance = accessible_instance(&state, &auth, id).await?;
    let contact = accessible_contact(&state, &instance, contact_id).await?;

    let mut tx = state.pool.begin().await?;
    let message = db::whatsapp_messages::insert(
        &mut *tx,
        instance.id,
        contact.id,
        &NewMessage {
            content: Some(req.content),
            is_from_me: true,
            ..NewMessage::default()
        },
    )
    .await?;
    db::whatsapp_contacts::touch(&mut *tx, contact.id).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Record an incoming message, creating the contact on first contact.
pub async fn inbound(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<InboundMessage>,
) -> Result<(StatusCode, Json<InboundResult>), AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;

    let phone = validation::digits_only(&req.phone_number);
    if phone.is_empty() {
        return Err(AppError::BadRequest("phone_number is required".to_string()));
    }
    let content = validation::blank_to_none(req.content);
    let media_url = validation::blank_to_none(req.media_url);
    if content.is_none() && media_url.is_none() {
        return Err(AppError::BadRequest(
            "content or media_url is required".to_string(),
        ));
    }

    let name = validation::blank_to_none(req.name);

    let mut tx = state.pool.begin().await?;
    let contact =
        db::whatsapp_contacts::upsert(&mut *tx, instance.id, &phone, name.as_deref()).await?;
    let message = db::whatsapp_messages::insert(
        &mut *tx,
        instance.id,
        contact.id,
        &NewMessage {
            content,
            media_type: validation::blank_to_none(req.media_type),
            media_url,
            ..NewMessage::default()
        },
    )
    .await?;
    db::whatsapp_contacts::bump_unread(&mut *tx, contact.id).await?;
    tx.commit().await?;

    let contact = accessible_contact(&state, &instance, contact.id).await?;
    Ok((StatusCode::CREATED, Json(InboundResult { contact, message })))
}

pub async fn mark_read(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<WhatsappContact>, AppError> {
    let instance = accessible_instance(&state, &auth, id).await?;
    let contact = accessible_contact(&state, &instance, contact_id).await?;
    db::whatsapp_contacts::mark_read(&state.pool, contact.id).await?;
    Ok(Json(accessible_contact(&state, &instance, contact.id).await?))
}
