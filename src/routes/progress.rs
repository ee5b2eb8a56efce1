use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/report", get(progress_report))
}

async fn progress_report(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let report = state.engine().progress_report(&auth.user_id)?;
    Ok(ok(report))
}
