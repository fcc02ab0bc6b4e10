use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::matricula::{self, LoginType, MatriculaLookup};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LookupQuery {
    #[serde(rename = "loginType")]
    pub login_type: Option<String>,
}

#[derive(Serialize)]
pub struct LookupResponse {
    pub matricula: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// Anonymous status check used by the login page before asking for a password.
pub async fn lookup(
    State(state): State<SharedState>,
    Path(raw): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, AppError> {
    let login_type = match query.login_type.as_deref() {
        None => LoginType::Client,
        Some(raw) => LoginType::parse(raw)
            .ok_or_else(|| AppError::BadRequest("Invalid loginType".to_string()))?,
    };

    let matricula = matricula::normalize(&raw, login_type)
        .ok_or_else(|| AppError::BadRequest("Invalid matricula".to_string()))?;

    let result = matricula::lookup(&state.pool, login_type, &matricula).await?;
    let status = result.as_str();
    let rejection_reason = match result {
        MatriculaLookup::Rejected(reason) => reason,
        _ => None,
    };

    Ok(Json(LookupResponse {
        matricula,
        status,
        rejection_reason,
    }))
}
