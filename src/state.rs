use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::llm::ChatClient;
use crate::rate_limit::{ChatRateLimiter, LoginRateLimiter};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub system_mailer: Option<Arc<SystemMailer>>,
    pub chat: ChatClient,
    pub chat_limiter: ChatRateLimiter,
    pub login_limiter: LoginRateLimiter,
}
