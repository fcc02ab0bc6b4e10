use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::reports::{ClientSummary, Overview};
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct MyReport {
    /// `None` until the tenant creates its WhatsApp instance.
    pub instance_status: Option<String>,
    pub is_ai_active: Option<bool>,
    #[serde(flatten)]
    pub summary: ClientSummary,
}

pub async fn overview(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Overview>, AppError> {
    auth.require_admin()?;
    Ok(Json(db::reports::overview(&state.pool).await?))
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<MyReport>, AppError> {
    let plan = db::clients::find_by_user_id(&state.pool, auth.user_id)
        .await?
        .map(|c| c.plan);
    let instance = db::whatsapp_instances::list(&state.pool, Some(auth.user_id), None)
        .await?
        .into_iter()
        .next();
    let summary = db::reports::client_summary(&state.pool, auth.user_id, plan.as_deref()).await?;

    Ok(Json(MyReport {
        instance_status: instance.as_ref().map(|i| i.status.clone()),
        is_ai_active: instance.map(|i| i.is_ai_active),
        summary,
    }))
}
