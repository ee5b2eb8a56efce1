use std::sync::Arc;
use std::time::Instant;

use crate::adaptive::engine::ExerciseEngine;
use crate::config::Config;
use crate::services::exercise_data::ExerciseDataService;
use crate::services::word_info::WordInfoService;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    engine: Arc<ExerciseEngine>,
    word_info: Arc<WordInfoService>,
    exercise_data: Arc<ExerciseDataService>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        engine: Arc<ExerciseEngine>,
        word_info: Arc<WordInfoService>,
        config: &Config,
    ) -> Self {
        let exercise_data = Arc::new(ExerciseDataService::new(store.clone(), word_info.clone()));
        Self {
            store,
            engine,
            word_info,
            exercise_data,
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn engine(&self) -> &ExerciseEngine {
        &self.engine
    }

    pub fn word_info(&self) -> &WordInfoService {
        &self.word_info
    }

    pub fn exercise_data(&self) -> &ExerciseDataService {
        &self.exercise_data
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
