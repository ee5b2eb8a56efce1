use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use exercise_engine::adaptive::config::AdaptiveConfig;
use exercise_engine::adaptive::engine::ExerciseEngine;
use exercise_engine::config::Config;
use exercise_engine::logging::{init_tracing, LogConfig};
use exercise_engine::routes::build_router;
use exercise_engine::services::word_info::WordInfoService;
use exercise_engine::services::Providers;
use exercise_engine::state::AppState;
use exercise_engine::store::Store;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });
    tracing::info!("Starting exercise-engine");

    let adaptive_config = AdaptiveConfig::from_env(&config.engine);
    adaptive_config
        .validate()
        .map_err(|e| format!("Invalid engine configuration: {e}"))?;

    if config.public_base_url.is_none() {
        tracing::warn!("PUBLIC_BASE_URL not set, audio URLs fall back to the request Host header");
    }

    let store = Arc::new(Store::open(&config.sled_path)?);
    store.run_migrations()?;

    let providers = Providers::from_config(&config.providers, &config.static_dir);
    let word_info = Arc::new(WordInfoService::new(
        providers,
        store.clone(),
        config.engine.complexity_cache_capacity,
    ));
    let engine = Arc::new(ExerciseEngine::new(
        adaptive_config,
        store.clone(),
        word_info.clone(),
    ));

    let state = AppState::new(store.clone(), engine, word_info, &config);

    let cors_layer = build_cors_layer(&config)?;

    let app = build_router(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer, BoxError> {
    if config.cors_origin.trim() == "*" {
        // 通配符模式仅用于开发环境
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_credentials(false)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any));
    }

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| format!("Invalid CORS_ORIGIN '{}': {e}", config.cors_origin))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_methods(Any))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
}
