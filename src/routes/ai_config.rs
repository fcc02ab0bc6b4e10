use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::ai_config::{self, MAX_FORMALITY, MIN_FORMALITY, MemoryStatus};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::ai_configs::AiConfigUpdate;
use crate::error::AppError;
use crate::models::{AiConfig, Tone};
use crate::state::SharedState;
use crate::validation;

#[derive(Serialize)]
pub struct AiConfigView {
    #[serde(flatten)]
    pub config: AiConfig,
    pub memory_status: MemoryStatus,
}

impl From<AiConfig> for AiConfigView {
    fn from(config: AiConfig) -> Self {
        let memory_status = ai_config::memory_status(config.knowledge_base.as_ref());
        Self {
            config,
            memory_status,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateAiConfig {
    pub ai_name: Option<String>,
    pub welcome_message: Option<String>,
    pub tone: Option<Tone>,
    pub formality_level: Option<i32>,
    pub allowed_emojis: Option<Vec<String>>,
    pub business_hours: Option<Value>,
    pub knowledge_base: Option<Value>,
    pub faqs: Option<Value>,
    pub triggers: Option<Value>,
}

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub message: String,
}

fn validate(req: UpdateAiConfig) -> Result<AiConfigUpdate, AppError> {
    if let Some(level) = req.formality_level {
        if !(MIN_FORMALITY..=MAX_FORMALITY).contains(&level) {
            return Err(AppError::BadRequest(format!(
                "formality_level must be between {MIN_FORMALITY} and {MAX_FORMALITY}"
            )));
        }
    }
    for (field, value) in [("faqs", &req.faqs), ("triggers", &req.triggers)] {
        if value.as_ref().is_some_and(|v| !v.is_array()) {
            return Err(AppError::BadRequest(format!("{field} must be an array")));
        }
    }
    if req.knowledge_base.as_ref().is_some_and(|v| !v.is_object()) {
        return Err(AppError::BadRequest(
            "knowledge_base must be an object".to_string(),
        ));
    }

    Ok(AiConfigUpdate {
        ai_name: validation::blank_to_none(req.ai_name),
        welcome_message: validation::blank_to_none(req.welcome_message),
        tone: req.tone,
        formality_level: req.formality_level,
        allowed_emojis: req.allowed_emojis,
        business_hours: req.business_hours,
        knowledge_base: req.knowledge_base,
        faqs: req.faqs,
        triggers: req.triggers,
    })
}

pub async fn get_own(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<AiConfigView>, AppError> {
    let config = db::ai_configs::find_or_create(&state.pool, auth.user_id).await?;
    Ok(Json(config.into()))
}

pub async fn update_own(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateAiConfig>,
) -> Result<Json<AiConfigView>, AppError> {
    let changes = validate(req)?;
    let config = db::ai_configs::update(&state.pool, auth.user_id, &changes).await?;
    Ok(Json(config.into()))
}

pub async fn reset_own(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<AiConfigView>, AppError> {
    let config = db::ai_configs::reset_knowledge(
        &state.pool,
        auth.user_id,
        &ai_config::default_knowledge(),
    )
    .await?;
    Ok(Json(config.into()))
}

pub async fn preview(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<Value>, AppError> {
    validation::require_non_empty(&req.message, "message")?;
    let config = db::ai_configs::find_or_create(&state.pool, auth.user_id).await?;
    Ok(Json(json!({
        "message": req.message,
        "reply": ai_config::preview_reply(&config),
    })))
}

pub async fn get_for_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AiConfigView>, AppError> {
    auth.require_admin()?;
    let config = db::ai_configs::find_by_user(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("AI config not found".to_string()))?;
    Ok(Json(config.into()))
}

pub async fn update_for_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateAiConfig>,
) -> Result<Json<AiConfigView>, AppError> {
    auth.require_admin()?;
    let changes = validate(req)?;

    db::users::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let config = db::ai_configs::update(&state.pool, user_id, &changes).await?;
    Ok(Json(config.into()))
}
