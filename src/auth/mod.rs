use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod sessions;

pub use repo_types::User;
pub use sessions::{InMemorySessions, SessionStore};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
