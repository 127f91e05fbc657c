use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;

use crate::application::{error::AppError, warmer::WarmReport};

use super::{
    AppState,
    middleware::{log_responses, set_request_context},
};

pub fn build_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/cache/warm", post(warm_cache))
        .route("/cache", delete(invalidate_cache))
        .route("/_health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WarmQuery {
    clear: bool,
}

async fn warm_cache(
    State(state): State<AppState>,
    Query(query): Query<WarmQuery>,
) -> Result<Json<WarmReport>, AppError> {
    let report = state.warmer.warm(query.clear).await?;
    Ok(Json(report))
}

async fn invalidate_cache(State(state): State<AppState>) -> Response {
    state.gateway.invalidate_all().await;
    StatusCode::NO_CONTENT.into_response()
}

async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
