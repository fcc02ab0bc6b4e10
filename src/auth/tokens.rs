//! Opaque refresh/reset tokens and the cookies that carry the session.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::jwt::{ACCESS_TOKEN_MINUTES, Claims, encode_token};
use crate::db;
use crate::db::tokens::TokenKind;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::state::SharedState;

pub const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: Option<Role>,
}

pub fn generate_opaque() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn session_cookies(access_token: &str, refresh_token: &str) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(ACCESS_TOKEN_MINUTES))
        .build();

    let refresh = Cookie::build(("refresh_token", refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(REFRESH_TOKEN_DAYS))
        .build();

    CookieJar::new().add(access).add(refresh)
}

pub fn clear_session_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

/// Mint an access token plus a stored refresh token for `user`.
pub async fn issue_session(
    state: &SharedState,
    user: &User,
) -> Result<(CookieJar, AuthResponse), AppError> {
    let access_token = encode_token(&Claims::new(user.id, &user.email), &state.config.jwt_secret)
        .map_err(AppError::Internal)?;

    let refresh = generate_opaque();
    db::tokens::create(
        &state.pool,
        TokenKind::Refresh,
        user.id,
        &hash_token(&refresh),
        Utc::now() + Duration::days(REFRESH_TOKEN_DAYS),
    )
    .await?;

    let role = Role::highest(db::user_roles::roles_for_user(&state.pool, user.id).await?);

    let jar = session_cookies(&access_token, &refresh);
    Ok((
        jar,
        AuthResponse {
            access_token,
            refresh_token: refresh,
            user_id: user.id,
            email: user.email.clone(),
            role,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_tokens_are_unique_hex() {
        let a = generate_opaque();
        let b = generate_opaque();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_stable_sha256() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_eq!(hash_token("abc").len(), 64);
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
