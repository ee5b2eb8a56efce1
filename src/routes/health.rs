use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

fn store_healthy(state: &AppState) -> bool {
    state.store().get_cognitive_state("__health_check__").is_ok()
}

pub async fn health_check(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let healthy = store_healthy(&state);
    Json(serde_json::json!({
        "status": if healthy { "ok" } else { "degraded" },
        "uptimeSecs": state.uptime_secs(),
        "store": {
            "healthy": healthy,
            "masterWords": state.store().count_master_words(),
        },
        "engine": {
            "strategy": state.engine().strategy_name(),
            "epsilon": state.engine().config().selection.epsilon,
            "complexityCacheEntries": state.word_info().cache_len(),
        }
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if store_healthy(&state) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
