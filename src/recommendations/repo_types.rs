use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

/// Row of the history listing query.
#[derive(Debug, FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub occasion: String,
    pub style_preference: String,
    pub created_at: OffsetDateTime,
    pub recommendation_json: String,
}

/// One entry of a user's recommendation history.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub id: Uuid,
    pub occasion: String,
    pub style_preference: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub outfit_title: String,
    pub color_of_the_day: String,
}

impl From<HistoryRow> for HistorySummary {
    fn from(r: HistoryRow) -> Self {
        // Only a damaged row fails here; it is still listed, with blank fields.
        let stored: serde_json::Value = match serde_json::from_str(&r.recommendation_json) {
            Ok(v) => v,
            Err(e) => {
                warn!(recommendation_id = %r.id, error = %e, "stored recommendation is not valid JSON");
                serde_json::Value::Null
            }
        };
        let field = |name: &str| {
            stored
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        Self {
            id: r.id,
            occasion: r.occasion,
            style_preference: r.style_preference,
            created_at: r.created_at,
            outfit_title: field("outfit_title"),
            color_of_the_day: field("color_of_the_day"),
        }
    }
}
