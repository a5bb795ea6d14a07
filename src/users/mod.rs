use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod token;
pub mod validation;
pub(crate) mod extractors;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
