use anyhow::Context;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::repo_types::{HistoryRow, HistorySummary};
use crate::stylist::{Recommendation, StyleInput};

/// Appends one history row and returns its id.
pub async fn record(
    db: &SqlitePool,
    user_id: Uuid,
    input: &StyleInput,
    recommendation: &Recommendation,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let json = serde_json::to_string(recommendation).context("serialize recommendation")?;

    sqlx::query(
        r#"
        INSERT INTO recommendations
            (id, user_id, body_type, occasion, weather, budget,
             style_preference, color_preference, recommendation_json, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&input.body_type)
    .bind(&input.occasion)
    .bind(&input.weather)
    .bind(&input.budget)
    .bind(&input.style_preference)
    .bind(input.color_preference.as_deref())
    .bind(json)
    .bind(crate::db::now())
    .execute(db)
    .await
    .context("insert recommendation")?;

    Ok(id)
}

/// Most recent first, at most `limit` rows, only `user_id`'s.
pub async fn list_recent(
    db: &SqlitePool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<HistorySummary>> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT id, occasion, style_preference, created_at, recommendation_json
        FROM recommendations
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit.max(0))
    .fetch_all(db)
    .await
    .context("list recommendations")?;

    Ok(rows.into_iter().map(HistorySummary::from).collect())
}
