use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::auth::tokens::{
    AuthResponse, clear_session_cookies, generate_opaque, hash_token, issue_session,
};
use crate::db;
use crate::db::tokens::TokenKind;
use crate::error::AppError;
use crate::matricula::{LoginType, MatriculaRecord};
use crate::middleware::audit;
use crate::middleware::client_ip::ClientIp;
use crate::models::{Client, Role, User};
use crate::provisioning;
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct MatriculaLoginRequest {
    #[serde(rename = "loginType")]
    pub login_type: String,
    pub matricula: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: User,
    pub role: Role,
    pub is_admin: bool,
    pub client: Option<Client>,
}

/// Creates the first account as super admin. Closed once any user exists.
pub async fn register(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    validation::require_non_empty(&req.full_name, "full_name")?;
    let email = validation::normalize_email(&req.email)?;
    password::check_strength(&req.password).map_err(AppError::BadRequest)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock serialises concurrent bootstrap registrations
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    if db::users::count_all(&mut *tx).await? > 0 {
        return Err(AppError::Forbidden(
            "Registration is disabled. Contact your system administrator.".to_string(),
        ));
    }

    let user = db::users::create(&mut *tx, &email, &pw_hash, req.full_name.trim(), true).await?;
    db::user_roles::assign(&mut *tx, user.id, Role::SuperAdmin).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, "Bootstrap super admin registered");
    audit::log_event(
        &state.pool,
        Some(user.id),
        "Super admin registrado",
        None,
        Some(&ip.to_string()),
    )
    .await;

    let (jar, body) = issue_session(&state, &user).await?;
    Ok((jar, Json(body)))
}

/// Deactivated admins and clients may not open new sessions by any route.
async fn ensure_active(state: &SharedState, user: &User) -> Result<(), AppError> {
    if db::users::is_deactivated(&state.pool, user.id).await? {
        return Err(AppError::Forbidden("Account inactive".to_string()));
    }
    Ok(())
}

pub async fn login(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    if state.login_limiter.check(&req.email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = db::users::find_by_email(&state.pool, req.email.trim()).await? else {
        state.login_limiter.record_failure(&req.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    if !password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)? {
        state.login_limiter.record_failure(&req.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    state.login_limiter.reset(&req.email);
    ensure_active(&state, &user).await?;
    db::users::touch_sign_in(&state.pool, user.id).await?;
    audit::log_event(&state.pool, Some(user.id), "Login", None, Some(&ip.to_string())).await;

    let (jar, body) = issue_session(&state, &user).await?;
    Ok((jar, Json(body)))
}

/// Sign in with a matricula. The auth account is provisioned on first use, with
/// the CPF digits as its initial password.
pub async fn matricula_login(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<MatriculaLoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let login_type = LoginType::parse(&req.login_type)
        .ok_or_else(|| AppError::BadRequest("Invalid loginType".to_string()))?;

    let limiter_key = validation::digits_only(&req.matricula);
    if state.login_limiter.check(&limiter_key).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let provisioned = provisioning::provision(&state.pool, login_type, &req.matricula).await?;

    if !password::verify(&req.password, &provisioned.user.password_hash)
        .map_err(AppError::Internal)?
    {
        state.login_limiter.record_failure(&limiter_key);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    state.login_limiter.reset(&limiter_key);
    db::users::touch_sign_in(&state.pool, provisioned.user.id).await?;
    if let MatriculaRecord::Client(client) = &provisioned.record {
        db::clients::touch_login(&state.pool, client.id).await?;
    }

    audit::log_event(
        &state.pool,
        Some(provisioned.user.id),
        "Login por matrícula",
        Some(json!({ "matricula": limiter_key, "loginType": req.login_type })),
        Some(&ip.to_string()),
    )
    .await;

    let (jar, body) = issue_session(&state, &provisioned.user).await?;
    Ok((jar, Json(body)))
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let stored = db::tokens::find_by_hash(&state.pool, TokenKind::Refresh, &hash_token(&refresh_value))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if stored.used {
        tracing::warn!(
            "Refresh token reuse detected for user {}. Revoking all sessions.",
            stored.user_id
        );
        db::tokens::delete_all_for_user(&state.pool, TokenKind::Refresh, stored.user_id).await?;
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    db::tokens::mark_used(&state.pool, TokenKind::Refresh, stored.id).await?;

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    ensure_active(&state, &user).await?;

    let (jar, body) = issue_session(&state, &user).await?;
    Ok((jar, Json(body)))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        db::tokens::delete_by_hash(&state.pool, TokenKind::Refresh, &hash_token(cookie.value()))
            .await?;
    }

    Ok((
        clear_session_cookies(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // Same answer whether or not the email exists
    let response = Json(MessageResponse {
        message: "If that email is registered, a reset link has been sent.".to_string(),
    });

    let pool = state.pool.clone();
    let mailer = state.system_mailer.clone();
    let base_url = state.config.base_url.clone();

    tokio::spawn(async move {
        let Ok(Some(user)) = db::users::find_by_email(&pool, req.email.trim()).await else {
            return;
        };

        let token = generate_opaque();
        if let Err(e) = db::tokens::create(
            &pool,
            TokenKind::PasswordReset,
            user.id,
            &hash_token(&token),
            Utc::now() + Duration::hours(1),
        )
        .await
        {
            tracing::error!("Failed to store password reset token: {e}");
            return;
        }

        let reset_url = format!("{base_url}/login?reset_token={token}");
        match mailer {
            Some(mailer) => {
                if let Err(e) = mailer.send_password_reset(&user.email, &reset_url).await {
                    tracing::error!("Failed to send password reset email: {e}");
                }
            }
            None => tracing::warn!("System SMTP not configured. Password reset token: {token}"),
        }
    });

    Ok(response)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    password::check_strength(&req.password).map_err(AppError::BadRequest)?;

    let reset_token = db::tokens::find_valid_by_hash(
        &state.pool,
        TokenKind::PasswordReset,
        &hash_token(&req.token),
    )
    .await?
    .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    db::tokens::mark_used(&state.pool, TokenKind::PasswordReset, reset_token.id).await?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, reset_token.user_id, &pw_hash).await?;
    db::tokens::delete_all_for_user(&state.pool, TokenKind::Refresh, reset_token.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    ClientIp(ip): ClientIp,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    password::check_strength(&req.new_password).map_err(AppError::BadRequest)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !password::verify(&req.current_password, &user.password_hash).map_err(AppError::Internal)? {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;
    db::tokens::delete_all_for_user(&state.pool, TokenKind::Refresh, user.id).await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "Senha alterada",
        None,
        Some(&ip.to_string()),
    )
    .await;

    let (jar, body) = issue_session(&state, &user).await?;
    Ok((jar, Json(body)))
}

pub async fn me(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let client = if auth.role == Role::Client {
        db::clients::find_by_user_id(&state.pool, auth.user_id).await?
    } else {
        None
    };

    Ok(Json(MeResponse {
        user,
        role: auth.role,
        is_admin: auth.is_admin(),
        client,
    }))
}
