pub mod exercises;
pub mod health;
pub mod progress;
pub mod words;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use tower_http::services::ServeDir;

use crate::response::ErrorBody;
use crate::state::AppState;

/// Maximum request body size: 1 MiB.
const MAX_BODY_SIZE: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/exercises", exercises::router())
        .nest("/words", words::router())
        .nest("/progress", progress::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    let static_files = ServeDir::new(&state.config().static_dir);

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .nest_service("/static", static_files)
        .fallback(fallback_404)
        .with_state(state)
}

async fn fallback_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            code: "NOT_FOUND".to_string(),
            message: "Recurso não encontrado".to_string(),
        }),
    )
}
