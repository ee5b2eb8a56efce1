use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use exercise_engine::adaptive::config::AdaptiveConfig;
use exercise_engine::adaptive::engine::ExerciseEngine;
use exercise_engine::config::{Config, EngineEnvConfig, ProviderConfig};
use exercise_engine::routes::build_router;
use exercise_engine::services::word_info::WordInfoService;
use exercise_engine::services::Providers;
use exercise_engine::state::AppState;
use exercise_engine::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub store: Arc<Store>,
    _temp_dir: TempDir,
}

fn test_config(temp_dir: &TempDir) -> Config {
    let sled_path = temp_dir.path().join("exercise-test.sled");
    let static_dir = temp_dir.path().join("static");

    // 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        jwt_secret: format!("integration-test-jwt-secret-{}", uuid::Uuid::new_v4()),
        jwt_expires_in_hours: 24,
        cors_origin: "http://localhost:5173".to_string(),
        static_dir: static_dir.to_string_lossy().to_string(),
        public_base_url: None,
        engine: EngineEnvConfig::default(),
        providers: ProviderConfig::offline(),
    }
}

async fn spawn_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(&temp_dir);
    configure(&mut config);

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let providers = Providers::from_config(&config.providers, &config.static_dir);
    let word_info = Arc::new(WordInfoService::new(
        providers,
        store.clone(),
        config.engine.complexity_cache_capacity,
    ));
    let engine = Arc::new(
        ExerciseEngine::new(
            AdaptiveConfig::from_env(&config.engine),
            store.clone(),
            word_info.clone(),
        )
        .with_seed(7),
    );

    let state = AppState::new(store.clone(), engine, word_info, &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        store,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with(|_| {}).await
}

/// ε = 0: the engine always exploits, which keeps HTTP assertions stable.
pub async fn spawn_greedy_test_app() -> TestApp {
    spawn_with(|config| config.engine.epsilon = 0.0).await
}

pub async fn spawn_test_app_with_base_url(base_url: &str) -> TestApp {
    let base_url = base_url.to_string();
    spawn_with(move |config| config.public_base_url = Some(base_url)).await
}
