use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::AppError,
    state::AppState,
    users::{
        dto::{LoginRequest, RegisterRequest, UserResponse, WebResponse},
        extractors::AuthUser,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/current", get(current))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<WebResponse<UserResponse>>, AppError> {
    let user = state.users.register(payload).await?;
    Ok(Json(WebResponse::new(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<WebResponse<UserResponse>>, AppError> {
    let user = state.users.login(payload).await?;
    Ok(Json(WebResponse::new(user)))
}

#[instrument(skip_all)]
pub async fn current(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<WebResponse<UserResponse>> {
    Json(WebResponse::new(state.users.current(user)))
}
