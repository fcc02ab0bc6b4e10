//! Public function endpoints. Every response, errors included, carries permissive
//! CORS headers (added by the router layer in `routes::function_routes`).

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::llm::ChatMessage;
use crate::matricula::LoginType;
use crate::middleware::client_ip::ClientIp;
use crate::provisioning;
use crate::state::SharedState;

pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

/// Preflight answer shared by both functions.
pub async fn preflight() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub async fn isa_chat(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let req: ChatRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;

    if let Err(retry_after) = state.chat_limiter.check(ip) {
        return Err(AppError::RateLimited(format!(
            "Too many requests. Try again in {retry_after}s."
        )));
    }

    let reply = state
        .chat
        .complete(&req.messages)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    tracing::info!(%ip, turns = req.messages.len(), "isa-chat reply generated");
    Ok(Json(json!({ "message": reply })))
}

pub async fn provision_user(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    // Only unparseable JSON is a server-side failure; field shapes are validated below.
    let req: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Upstream(format!("Invalid JSON body: {e}")))?;

    let login_type = req
        .get("loginType")
        .and_then(Value::as_str)
        .and_then(LoginType::parse)
        .ok_or_else(|| AppError::BadRequest("Invalid loginType".to_string()))?;

    let matricula = match req.get("matricula") {
        None | Some(Value::Null) => "",
        Some(Value::String(raw)) => raw.as_str(),
        Some(_) => return Err(AppError::BadRequest("Invalid matricula".to_string())),
    };

    let provisioned = provisioning::provision(&state.pool, login_type, matricula).await?;

    Ok(Json(json!({ "ok": true, "email": provisioned.record.email().trim() })))
}
