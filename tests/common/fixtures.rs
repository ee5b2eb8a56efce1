use chrono::Utc;

use exercise_engine::adaptive::complexity::{length_fallback, DifficultyLevel};
use exercise_engine::store::operations::master_words::MasterWord;
use exercise_engine::store::Store;

/// Seeds a master word with a fixed composite score so band filtering is predictable.
pub fn seed_master_word(store: &Store, text: &str, composite: f64) -> MasterWord {
    let mut metrics = length_fallback(text);
    metrics.composite_score = composite;
    let word = MasterWord {
        text: text.to_string(),
        definition: None,
        difficulty_level: DifficultyLevel::from_score(composite),
        complexity_metrics: metrics,
        updated_at: Utc::now(),
    };
    store.upsert_master_word(&word).expect("seed master word");
    word
}

/// Beginner-band words: a fresh learner (ability 0) draws from `[0, 2]`.
pub fn seed_beginner_words(store: &Store) -> Vec<MasterWord> {
    [("sol", 0.5), ("mar", 1.0), ("casa", 1.5), ("rua", 2.0)]
        .into_iter()
        .map(|(text, score)| seed_master_word(store, text, score))
        .collect()
}
