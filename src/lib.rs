pub mod ai_config;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod email;
pub mod error;
pub mod llm;
pub mod matricula;
pub mod middleware;
pub mod models;
pub mod provisioning;
pub mod rate_limit;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod validation;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::llm::ChatClient;
use crate::rate_limit::{ChatRateLimiter, LoginRateLimiter};
use crate::state::{AppState, SharedState};

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Assemble the full application. The returned state is shared with
/// background tasks such as the scheduler.
pub fn build_app(pool: PgPool, config: Config) -> Result<(Router, SharedState), String> {
    let system_mailer = config.smtp.as_ref().and_then(|smtp| {
        match SystemMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("System SMTP configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("System SMTP not available: {e}");
                None
            }
        }
    });

    let chat = ChatClient::new(&config.llm)?;
    if config.llm.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY not set, isa-chat will answer with 500");
    }

    let state: SharedState = Arc::new(AppState {
        pool,
        chat,
        system_mailer,
        chat_limiter: ChatRateLimiter::new(config.chat_rate_limit, Duration::from_secs(60)),
        login_limiter: LoginRateLimiter::new(),
        config,
    });

    let api = routes::api_routes().layer(api_cors_layer(&state.config.cors_origins));

    let app = Router::new()
        .merge(api)
        .merge(routes::function_routes())
        .merge(views::view_routes())
        .nest_service("/static", ServeDir::new("static"))
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state.clone());

    Ok((app, state))
}

/// CORS for the panel API. Empty origin list means same-origin only;
/// credentials are allowed only for explicit origins.
fn api_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS allows any origin for /api; cookies will not be sent cross-origin");
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if allowed.is_empty() {
        layer
    } else {
        layer.allow_origin(allowed).allow_credentials(true)
    }
}

async fn health() -> &'static str {
    "ok"
}
