use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        extractors::{AuthUser, MaybeBearer},
        repo_types::User,
        services,
    },
    error::{AppError, AppJson},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
}

async fn issue_response(state: &AppState, user: User, message: &'static str) -> AuthResponse {
    let access_token = state.sessions.issue(user.id).await;
    AuthResponse {
        message,
        access_token,
        token_type: "bearer",
        user: user.into(),
    }
}

/// Registers and immediately logs the new user in.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = services::register(&state.db, &payload.username, &payload.email, &payload.password)
        .await?;
    Ok(Json(issue_response(&state, user, "Registration successful!").await))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = services::verify(&state.db, &payload.username, &payload.password).await?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(issue_response(&state, user, "Login successful!").await))
}

#[instrument(skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    MaybeBearer(token): MaybeBearer,
) -> Json<MessageResponse> {
    if let Some(token) = token {
        state.sessions.revoke(&token).await;
    }
    Json(MessageResponse {
        message: "Logged out successfully!",
    })
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}
