use std::env;

use anyhow::Context;

/// Server configuration loaded from environment variables (a `.env` file is
/// honored when present).
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    pub host: String,
    pub port: u16,

    // Store settings
    pub database_url: String,
    pub redis_url: String,

    // Audit channel
    pub user_log_channel: String,

    // Token settings: distinct secrets per token kind so access and refresh
    // artifacts can never cross-validate
    pub access_token_key: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_key: String,
    pub refresh_token_ttl_secs: u64,

    // CORS settings
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid port number")?,

            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            user_log_channel: env::var("REDIS_USER_LOG_CHANNEL")
                .unwrap_or_else(|_| "user_log_channel".to_string()),

            access_token_key: env::var("ACCESS_TOKEN_KEY")
                .unwrap_or_else(|_| "secret".to_string()),
            access_token_ttl_secs: parse_ttl("ACCESS_TOKEN_TTL", 3600)?,
            refresh_token_key: env::var("REFRESH_TOKEN_KEY")
                .unwrap_or_else(|_| "refresh_secret".to_string()),
            refresh_token_ttl_secs: parse_ttl("REFRESH_TOKEN_TTL", 86400)?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn parse_ttl(name: &str, default: u64) -> anyhow::Result<u64> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a number of seconds")),
        Err(_) => Ok(default),
    }
}
