pub mod account_requests;
pub mod admins;
pub mod ai_config;
pub mod announcements;
pub mod auth;
pub mod clients;
pub mod functions;
pub mod matricula;
pub mod reports;
pub mod system_logs;
pub mod tickets;
pub mod whatsapp;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use axum::routing::{delete, get, options, post, put};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/matricula-login", post(auth::matricula_login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/matricula/{matricula}", get(matricula::lookup))
        // Signup requests
        .route(
            "/api/v1/account-requests",
            get(account_requests::list).post(account_requests::create),
        )
        .route("/api/v1/account-requests/{id}", get(account_requests::get))
        .route(
            "/api/v1/account-requests/{id}/approve",
            post(account_requests::approve),
        )
        .route(
            "/api/v1/account-requests/{id}/reject",
            post(account_requests::reject),
        )
        // Clients
        .route("/api/v1/clients", get(clients::list))
        .route(
            "/api/v1/clients/{id}",
            get(clients::get)
                .put(clients::update)
                .delete(clients::deactivate),
        )
        .route(
            "/api/v1/profile",
            get(clients::get_profile).put(clients::update_profile),
        )
        // Admins & roles
        .route("/api/v1/admins", get(admins::list).post(admins::create))
        .route("/api/v1/admins/{id}", put(admins::update))
        .route(
            "/api/v1/roles/{user_id}",
            get(admins::get_roles).put(admins::set_role),
        )
        // WhatsApp
        .route(
            "/api/v1/whatsapp/instances",
            get(whatsapp::list).post(whatsapp::create),
        )
        .route(
            "/api/v1/whatsapp/instances/{id}",
            get(whatsapp::get)
                .put(whatsapp::update)
                .delete(whatsapp::delete),
        )
        .route(
            "/api/v1/whatsapp/instances/{id}/session",
            get(whatsapp::get_session)
                .put(whatsapp::store_session)
                .delete(whatsapp::clear_session),
        )
        .route(
            "/api/v1/whatsapp/instances/{id}/contacts",
            get(whatsapp::list_contacts),
        )
        .route(
            "/api/v1/whatsapp/instances/{id}/contacts/{contact_id}/messages",
            get(whatsapp::list_messages).post(whatsapp::send_message),
        )
        .route(
            "/api/v1/whatsapp/instances/{id}/contacts/{contact_id}/read",
            post(whatsapp::mark_read),
        )
        .route(
            "/api/v1/whatsapp/instances/{id}/inbound",
            post(whatsapp::inbound),
        )
        // AI config
        .route(
            "/api/v1/ai-config",
            get(ai_config::get_own).put(ai_config::update_own),
        )
        .route("/api/v1/ai-config/reset", post(ai_config::reset_own))
        .route("/api/v1/ai-config/preview", post(ai_config::preview))
        .route(
            "/api/v1/ai-config/{user_id}",
            get(ai_config::get_for_user).put(ai_config::update_for_user),
        )
        // Tickets
        .route("/api/v1/tickets", get(tickets::list).post(tickets::create))
        .route(
            "/api/v1/tickets/{id}",
            get(tickets::get).put(tickets::update),
        )
        .route("/api/v1/tickets/{id}/messages", post(tickets::add_message))
        // Announcements
        .route(
            "/api/v1/announcements",
            get(announcements::list_mine).post(announcements::create),
        )
        .route("/api/v1/announcements/all", get(announcements::list_all))
        .route("/api/v1/announcements/{id}", delete(announcements::delete))
        .route(
            "/api/v1/announcements/{id}/read",
            post(announcements::mark_read),
        )
        // Logs & reports
        .route("/api/v1/system-logs", get(system_logs::list))
        .route("/api/v1/reports/overview", get(reports::overview))
        .route("/api/v1/reports/me", get(reports::me))
}

/// `isa-chat` and `provision-user`, callable from any origin.
pub fn function_routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/functions/v1/isa-chat",
            post(functions::isa_chat).options(functions::preflight),
        )
        .route(
            "/functions/v1/provision-user",
            post(functions::provision_user).options(functions::preflight),
        )
        .route("/functions/v1/{*rest}", options(functions::preflight))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("access-control-allow-origin"),
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("access-control-allow-headers"),
            HeaderValue::from_static(functions::CORS_ALLOW_HEADERS),
        ))
}
