use std::sync::Arc;

use anyhow::Context;
use sqlx::SqlitePool;

use crate::auth::{InMemorySessions, SessionStore};
use crate::config::AppConfig;
use crate::llm::{GeminiClient, TextGenerator};
use crate::stylist::Stylist;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub stylist: Stylist,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = crate::db::connect(&config.database_url).await?;

        let gemini = GeminiClient::new(&config.llm).context("build Gemini client")?;
        tracing::info!(model = %gemini.model(), "text generator ready");

        let sessions = Arc::new(InMemorySessions::new(config.session.ttl_minutes));

        Ok(Self::from_parts(db, config, sessions, Arc::new(gemini)))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        sessions: Arc<dyn SessionStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            db,
            config,
            sessions,
            stylist: Stylist::new(generator),
        }
    }
}
