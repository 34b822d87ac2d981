use anyhow::Context;
use serde::Deserialize;

/// One year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;
pub const MAX_LLM_RETRIES: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a bearer token; 0 keeps tokens until logout or restart.
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://stylesense.db?mode=rwc".into());
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse::<u16>()
            .context("APP_PORT must be a valid port number")?;

        let session = SessionConfig {
            ttl_minutes: env_or("SESSION_TTL_MINUTES", 60i64 * 24).clamp(0, MAX_SESSION_TTL_MINUTES),
        };

        let llm = LlmConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .context("Required environment variable 'GEMINI_API_KEY' is not set")?,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            timeout_secs: env_or("LLM_TIMEOUT_SECS", 60),
            max_retries: env_or("LLM_MAX_RETRIES", 2u32).min(MAX_LLM_RETRIES),
        };

        Ok(Self {
            database_url,
            host,
            port,
            session,
            llm,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
