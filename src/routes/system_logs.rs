use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::SystemLog;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<SystemLog>>, AppError> {
    auth.require_admin()?;
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    Ok(Json(db::system_logs::list(&state.pool, limit, offset).await?))
}
