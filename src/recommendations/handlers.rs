use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{HistoryQuery, HistoryResponse, RecommendationResponse};
use super::repo;
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppJson, AppQuery},
    state::AppState,
    stylist::{discovery_links, StyleInput},
};

pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/recommend", post(recommend))
        .route("/history", get(history))
}

#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn recommend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(input): AppJson<StyleInput>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let recommendation = state.stylist.generate(&input).await?;
    let pinterest_links = discovery_links(&recommendation, &input.occasion, &input.style_preference);

    let id = repo::record(&state.db, user.id, &input, &recommendation).await?;
    info!(recommendation_id = %id, title = %recommendation.outfit_title, "recommendation stored");

    Ok(Json(RecommendationResponse {
        recommendation,
        pinterest_links,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppQuery(q): AppQuery<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let history = repo::list_recent(&state.db, user.id, q.clamped_limit()).await?;
    Ok(Json(HistoryResponse { history }))
}
