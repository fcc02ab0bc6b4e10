use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub encryption_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub trusted_proxies: Vec<IpNet>,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
    pub llm: LlmConfig,
    /// Requests per client IP per minute accepted by `isa-chat`.
    pub chat_rate_limit: u32,
    pub scheduler_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        let encryption_key = env_required("ISA_ENCRYPTION_KEY")?;

        let host: IpAddr = env_or("ISA_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid ISA_HOST: {e}"))?;

        let port: u16 = env_or("ISA_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid ISA_PORT: {e}"))?;

        let base_url = env_or("ISA_BASE_URL", &format!("http://{host}:{port}"));

        let trusted_proxies: Vec<IpNet> = split_list(&env_or("ISA_TRUSTED_PROXIES", ""))
            .map(|s| {
                s.parse()
                    .map_err(|e| format!("Invalid ISA_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cors_origins = split_list(&env_or("ISA_CORS_ORIGINS", ""))
            .map(str::to_string)
            .collect();

        let log_level = env_or("ISA_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("ISA_SMTP_HOST").ok(),
            std::env::var("ISA_SMTP_PORT").ok(),
            std::env::var("ISA_SMTP_USER").ok(),
            std::env::var("ISA_SMTP_PASS").ok(),
            std::env::var("ISA_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid ISA_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let llm = LlmConfig {
            api_key: std::env::var("GROQ_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: env_or("ISA_LLM_BASE_URL", "https://api.groq.com/openai/v1"),
            model: env_or("ISA_LLM_MODEL", "llama-3.1-70b-versatile"),
        };

        let chat_rate_limit: u32 = env_or("ISA_CHAT_RATE_LIMIT", "20")
            .parse()
            .map_err(|e| format!("Invalid ISA_CHAT_RATE_LIMIT: {e}"))?;

        let scheduler_interval_secs: u64 = env_or("ISA_SCHEDULER_INTERVAL_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid ISA_SCHEDULER_INTERVAL_SECS: {e}"))?;

        Ok(Config {
            database_url,
            jwt_secret,
            encryption_key,
            host,
            port,
            base_url,
            trusted_proxies,
            cors_origins,
            log_level,
            smtp,
            llm,
            chat_rate_limit,
            scheduler_interval_secs,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
