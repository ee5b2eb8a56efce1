use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

use crate::adaptive::types::ExerciseSubmission;
use crate::auth::AuthUser;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/next", get(next_exercise))
        .route("/submit", post(submit_exercise))
        .route("/multiple_choice/:word", get(multiple_choice))
        .route("/multiple_choice_image/:word", get(multiple_choice_image))
        .route("/define_word/:word", get(define_word))
        .route("/complete_sentence/:word", get(complete_sentence))
}

async fn next_exercise(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let outcome = state.engine().select_next_exercise(&auth.user_id).await?;
    Ok(ok(outcome))
}

async fn submit_exercise(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(submission): JsonBody<ExerciseSubmission>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let ack = state
        .engine()
        .submit_exercise_result(&auth.user_id, &submission)
        .await?;
    Ok(ok(ack))
}

async fn multiple_choice(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let exercise = state
        .exercise_data()
        .multiple_choice(&word)
        .await?
        .ok_or_else(|| {
            AppError::not_found("Não foi possível gerar exercício de múltipla escolha")
        })?;
    Ok(ok(exercise))
}

async fn multiple_choice_image(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let exercise = state
        .exercise_data()
        .multiple_choice_image(&word)
        .await?
        .ok_or_else(|| {
            AppError::not_found("Não foi possível gerar exercício de múltipla escolha (imagem)")
        })?;
    Ok(ok(exercise))
}

async fn define_word(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.exercise_data().define_word(&word)?))
}

async fn complete_sentence(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.exercise_data().complete_sentence(&word)?))
}
