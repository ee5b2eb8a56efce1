use axum::extract::{Path, State};
use axum::http::uri::Authority;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::constants::MAX_MASTER_WORD_BATCH;
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::services::word_info::MasterWordInput;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/master", post(ingest_master_words))
        .route("/:word", get(word_info))
}

/// Host header value when it is a bare `host[:port]` authority.
fn sanitized_host(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(header::HOST)?.to_str().ok()?;
    let authority: Authority = raw.parse().ok()?;
    // 拒绝 userinfo 写法（user@host）
    if authority.as_str().contains('@') {
        return None;
    }
    let host = authority.host();
    let well_formed = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '[' | ']' | ':'));
    well_formed.then_some(raw)
}

/// 配置的公开地址优先，否则由请求头推断
fn request_base_url(public_base_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base) = public_base_url {
        return base.to_string();
    }
    let host = sanitized_host(headers).unwrap_or_else(|| {
        if headers.contains_key(header::HOST) {
            tracing::warn!("Malformed Host header ignored for base URL");
        }
        "localhost"
    });
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .filter(|p| *p == "https" || *p == "http")
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

async fn word_info(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(word): Path<String>,
    headers: HeaderMap,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let base_url = request_base_url(state.config().public_base_url.as_deref(), &headers);
    let info = state.word_info().word_info(&word, &base_url).await?;
    Ok(ok(info))
}

#[derive(Debug, Deserialize)]
struct MasterWordsRequest {
    words: Vec<MasterWordInput>,
}

async fn ingest_master_words(
    _auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<MasterWordsRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    if req.words.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_BATCH",
            "Informe ao menos uma palavra",
        ));
    }
    if req.words.len() > MAX_MASTER_WORD_BATCH {
        return Err(AppError::payload_too_large(&format!(
            "No máximo {MAX_MASTER_WORD_BATCH} palavras por requisição"
        )));
    }

    let batch = state.word_info().ingest_master_words(req.words).await?;
    Ok(created(batch))
}
